//! Configuration management for `purview.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── log        # [log]
//! │   ├── runtime    # [runtime]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   └── error      # ConfigError
//! └── mod.rs         # PurviewConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[serve]`   | Demo server (interface, HTTP port, ws port)      |
//! | `[runtime]` | Unmount grace, flush bound, register timeout     |
//! | `[log]`     | Verbose logging                                  |
//!
//! A missing file yields the defaults; CLI flags override file values.

pub mod section;
pub mod types;

pub use section::{LogConfig, RuntimeConfig, ServeConfig};
pub use types::ConfigError;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands};
use crate::log;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing purview.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurviewConfig {
    /// Demo server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Engine settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl PurviewConfig {
    /// Load configuration for a CLI invocation: file (if present), then
    /// command-line overrides, then validation.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = if cli.config.exists() {
            Self::from_path(&cli.config)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", cli.config.display());
            Self::default()
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.max_flush_passes == 0 {
            return Err(ConfigError::Validation(
                "runtime.max_flush_passes must be at least 1".into(),
            ));
        }
        if self.serve.port != 0 && self.serve.port == self.serve.ws_port {
            return Err(ConfigError::Validation(format!(
                "serve.port and serve.ws_port are both {}",
                self.serve.port
            )));
        }
        Ok(())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if cli.verbose {
            self.log.verbose = true;
        }
        if let Commands::Serve {
            interface,
            port,
            ws_port,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.ws_port, ws_port.as_ref());
        }
    }

    fn update_option<T: Clone>(target: &mut T, value: Option<&T>) {
        if let Some(v) = value {
            *target = v.clone();
        }
    }
}

#[cfg(test)]
pub(crate) fn test_parse_config(content: &str) -> PurviewConfig {
    PurviewConfig::from_str(content).expect("test config should parse")
}
