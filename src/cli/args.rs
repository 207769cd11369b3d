//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Shared photo frame server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: photoframe.toml)
    #[arg(short = 'C', long, global = true, default_value = "photoframe.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the photo API, realtime channel and frontend
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Print the current photo list as JSON
    #[command(visible_alias = "l")]
    List {
        /// Photo directory (overrides [storage] dir)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

/// Serve command arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// HTTP port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// WebSocket port for realtime updates (default: port + 1)
    #[arg(long)]
    pub ws_port: Option<u16>,

    /// Photo directory (overrides [storage] dir)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Watch the photo directory for external changes
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,

    /// Poll the directory instead of using native notifications
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub poll: Option<bool>,

    /// Enable verbose output
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from([
            "photoframe", "serve", "-p", "8080", "--ws-port", "9000", "-d", "/srv/photos", "-w",
            "false", "--poll",
        ]);
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.ws_port, Some(9000));
        assert_eq!(args.dir, Some(PathBuf::from("/srv/photos")));
        assert_eq!(args.watch, Some(false));
        assert_eq!(args.poll, Some(true));
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_list_with_global_config() {
        let cli = Cli::parse_from(["photoframe", "list", "--pretty", "--config", "frame.toml"]);
        assert_eq!(cli.config, PathBuf::from("frame.toml"));
        assert!(matches!(
            cli.command,
            Commands::List { pretty: true, dir: None }
        ));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["photoframe", "s"]);
        assert_eq!(cli.config, PathBuf::from("photoframe.toml"));
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert!(args.interface.is_none());
        assert!(args.watch.is_none());
    }
}
