//! Logging Setup
//!
//! The library only emits `tracing` events. Binaries call [`init_tracing`]
//! once at startup; `RUST_LOG` takes precedence over the configured filter.

use crate::error::{KernelError, Result};
use tracing_subscriber::EnvFilter;

/// Output format of the fmt subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| KernelError::Logging(format!("invalid filter '{}': {}", default_filter, e)))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| KernelError::Logging(e.to_string()))
}
