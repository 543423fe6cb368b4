//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Server-rendered components kept live over a WebSocket
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: purview.toml)
    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = "purview.toml",
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the demo application over HTTP and WebSocket
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// HTTP port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// WebSocket port to listen on
        #[arg(short, long)]
        ws_port: Option<u16>,
    },

    /// Print the demo application's server-rendered HTML
    #[command(visible_alias = "r")]
    Render {
        /// Wrap the markup in the full page shell
        #[arg(long)]
        page: bool,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_render(&self) -> bool {
        matches!(self.command, Commands::Render { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::parse_from(["purview", "serve", "-i", "0.0.0.0", "-p", "8080", "-w", "8081"]);
        match cli.command {
            Commands::Serve {
                interface,
                port,
                ws_port,
            } => {
                assert_eq!(interface, Some("0.0.0.0".parse().unwrap()));
                assert_eq!(port, Some(8080));
                assert_eq!(ws_port, Some(8081));
            }
            Commands::Render { .. } => panic!("expected serve"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["purview", "r", "--page", "--verbose", "-C", "x.toml"]);
        assert!(cli.is_render());
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(cli.command, Commands::Render { page: true }));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["purview", "serve"]);
        assert!(cli.is_serve());
        assert!(!cli.verbose);
        assert_eq!(cli.config, PathBuf::from("purview.toml"));
    }
}
