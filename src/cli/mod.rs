//! Command-line interface module.

mod args;
pub mod demo;
pub mod render;
pub mod serve;

pub use args::{Cli, Commands};
