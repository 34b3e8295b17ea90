//! Runtime Settings
//!
//! Loaded from an optional TOML file with `ACTOR_KERNEL_*` environment
//! overrides, e.g. `ACTOR_KERNEL_BATCH_SIZE=64`.

use crate::actor::DEFAULT_BATCH_SIZE;
use crate::error::{KernelError, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ACTOR_KERNEL";

/// Settings for a [`crate::LocalRuntime`] and the process hosting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Server name of this runtime; PIDs with another server are remote
    pub server: String,

    /// Default messages per `work()` call
    pub batch_size: usize,

    /// Worker threads of the hosting tokio runtime
    pub worker_threads: usize,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            server: "local".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            log_filter: "info".to_string(),
        }
    }
}

impl RuntimeSettings {
    /// Load settings: defaults, then `path` (if given), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading runtime settings from {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;

        debug!(
            server = %settings.server,
            batch_size = settings.batch_size,
            worker_threads = settings.worker_threads,
            "Runtime settings loaded"
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(KernelError::invalid_setting("server", "must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(KernelError::invalid_setting("batch_size", "must be at least 1"));
        }
        if self.worker_threads == 0 {
            return Err(KernelError::invalid_setting("worker_threads", "must be at least 1"));
        }
        Ok(())
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file() -> NamedTempFile {
        tempfile::Builder::new().suffix(".toml").tempfile().unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.batch_size, 16);
        assert!(settings.worker_threads >= 1);
        settings.validate().unwrap();
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = toml_file();
        writeln!(file, "server = \"PRMR-7\"").unwrap();
        writeln!(file, "batch_size = 4").unwrap();
        file.flush().unwrap();

        let settings = RuntimeSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server, "PRMR-7");
        assert_eq!(settings.batch_size, 4);
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn test_load_rejects_zero_batch_size() {
        let mut file = toml_file();
        writeln!(file, "batch_size = 0").unwrap();
        file.flush().unwrap();

        let err = RuntimeSettings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, KernelError::InvalidSetting { field: "batch_size", .. }));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = RuntimeSettings::load(Some(Path::new("/nonexistent/actor-kernel.toml"))).unwrap_err();
        assert!(matches!(err, KernelError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_empty_server() {
        let err = RuntimeSettings::default().with_server("  ").validate().unwrap_err();
        assert!(matches!(err, KernelError::InvalidSetting { field: "server", .. }));
    }
}
