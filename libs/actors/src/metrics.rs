//! Runtime Metrics
//!
//! Relaxed atomic counters; a consistent cross-counter view is not needed.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by [`crate::LocalRuntime`]
#[derive(Debug, Default)]
pub struct RuntimeMetrics {
    pub actors_spawned: AtomicU64,
    pub actors_finished: AtomicU64,
    pub local_dispatches: AtomicU64,
    pub remote_dispatches: AtomicU64,
    pub inbound_deliveries: AtomicU64,
    pub actors_not_found: AtomicU64,
    pub network_errors: AtomicU64,
}

impl RuntimeMetrics {
    pub fn record_spawn(&self) {
        self.actors_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_finish(&self) {
        self.actors_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_dispatch(&self) {
        self.local_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_dispatch(&self) {
        self.remote_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inbound(&self) {
        self.inbound_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.actors_not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_error(&self) {
        self.network_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            actors_spawned: self.actors_spawned.load(Ordering::Relaxed),
            actors_finished: self.actors_finished.load(Ordering::Relaxed),
            local_dispatches: self.local_dispatches.load(Ordering::Relaxed),
            remote_dispatches: self.remote_dispatches.load(Ordering::Relaxed),
            inbound_deliveries: self.inbound_deliveries.load(Ordering::Relaxed),
            actors_not_found: self.actors_not_found.load(Ordering::Relaxed),
            network_errors: self.network_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RuntimeMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    pub actors_spawned: u64,
    pub actors_finished: u64,
    pub local_dispatches: u64,
    pub remote_dispatches: u64,
    pub inbound_deliveries: u64,
    pub actors_not_found: u64,
    pub network_errors: u64,
}

impl RuntimeStats {
    /// Actors spawned and not yet retired
    pub fn live_actors(&self) -> u64 {
        self.actors_spawned.saturating_sub(self.actors_finished)
    }

    /// Dispatches that could not be delivered, as a percentage of all dispatches
    pub fn failure_rate(&self) -> f64 {
        let total = self.local_dispatches + self.remote_dispatches;
        if total == 0 {
            return 0.0;
        }
        (self.actors_not_found + self.network_errors) as f64 / total as f64 * 100.0
    }
}
