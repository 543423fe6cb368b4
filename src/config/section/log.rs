//! `[log]` section configuration.
//!
//! ```toml
//! [log]
//! verbose = false     # Print debug channels (same as --verbose)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Print `debug!` output.
    pub verbose: bool,
}
