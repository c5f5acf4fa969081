//! skycheck - delayed check-in scheduler.
//!
//! Main entry point for the skycheck CLI and server.

mod cli;
mod server;

use clap::Parser;

use skycheck_config::{Config, ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands};
use crate::server::{init_tracing, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = ConfigLoader::load_or_default(&cli.config)?;

    match cli.command {
        None => {
            let port = std::env::var("PORT").ok().and_then(|p| p.parse().ok());
            apply_overrides(&mut config, None, port);
            init_tracing(&config.logging)?;
            run_server(config).await
        }
        Some(Commands::Serve { host, port }) => {
            apply_overrides(&mut config, host, port);
            init_tracing(&config.logging)?;
            run_server(config).await
        }
        Some(Commands::CheckConfig) => check_config(&cli.config, &config),
    }
}

fn apply_overrides(config: &mut Config, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}

/// Print validation results. Errors make the command fail.
fn check_config(
    path: &std::path::Path,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    println!("Config: {}", source);

    for warning in &result.warnings {
        println!("  warning  {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("  error    {}: {}", error.path, error.message);
    }

    result.into_result()?;
    println!("Configuration OK");
    Ok(())
}
