//! Configuration section definitions.
//!
//! Each module corresponds to a section in `purview.toml`:
//!
//! | Module    | TOML Section | Purpose                     |
//! |-----------|--------------|-----------------------------|
//! | `log`     | `[log]`      | Verbose logging             |
//! | `runtime` | `[runtime]`  | Engine timing and bounds    |
//! | `serve`   | `[serve]`    | Demo server                 |

mod log;
mod runtime;
mod serve;

pub use log::LogConfig;
pub use runtime::RuntimeConfig;
pub use serve::ServeConfig;
