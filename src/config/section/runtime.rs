//! `[runtime]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [runtime]
//! unmount_grace_ms = 10     # Delay before a disconnected root is unmounted
//! max_flush_passes = 16     # Re-render passes per flush before giving up
//! register_timeout_ms = 30000  # Drop rendered roots no client registers
//! ```
//!
//! The grace delay lets a reloading page re-bind its roots before their
//! instances are torn down. `0` unmounts as soon as the connection closes.
//! A `register_timeout_ms` of `0` keeps unregistered roots until shutdown.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Milliseconds between a connection closing and its roots unmounting.
    pub unmount_grace_ms: u64,

    /// Upper bound on reconcile passes triggered by hooks that keep
    /// queueing updates.
    pub max_flush_passes: usize,

    /// Milliseconds a rendered root may wait for its first connection.
    pub register_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            unmount_grace_ms: 10,
            max_flush_passes: 16,
            register_timeout_ms: 30_000,
        }
    }
}

impl RuntimeConfig {
    pub fn unmount_grace(&self) -> Duration {
        Duration::from_millis(self.unmount_grace_ms)
    }

    pub fn register_timeout(&self) -> Duration {
        Duration::from_millis(self.register_timeout_ms)
    }
}
