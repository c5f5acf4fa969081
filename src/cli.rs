//! CLI definitions for skycheck.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// skycheck CLI.
#[derive(Parser)]
#[command(name = "skycheck")]
#[command(about = "Schedules delayed airline check-ins and tracks their progress")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/skycheck.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the HTTP server in foreground (default)
    Serve {
        /// Bind host, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides `server.port`
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["skycheck"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config/skycheck.toml"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "skycheck",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--config",
            "/etc/skycheck.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/skycheck.toml"));
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_check_config_parses() {
        let cli = Cli::try_parse_from(["skycheck", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["skycheck", "serve", "--port", "http"]).is_err());
    }
}
