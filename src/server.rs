//! Tracing setup and server startup.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use skycheck_api::{ApiConfig, ApiServer};
use skycheck_config::{Config, ConfigValidator, LoggingConfig};
use skycheck_jobs::{CheckInService, FixedDelay, ProcessAction};

/// Initialize tracing with console output and, when `logging.dir` is set,
/// a daily rolling file.
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = match &logging.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("skycheck")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes on drop, so it lives for the whole process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

/// Run the HTTP server until Ctrl-C.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("config {}: {}", warning.path, warning.message);
    }

    info!("Starting skycheck v{}", env!("CARGO_PKG_VERSION"));
    info!(
        program = %config.action.program,
        args = ?config.action.args,
        delay_secs = config.scheduler.delay_secs,
        "check-in action configured"
    );

    let action = ProcessAction::from(&config.action);
    let policy = FixedDelay::from(&config.scheduler);
    let service = Arc::new(CheckInService::new(Arc::new(action), Arc::new(policy)));

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    let server = ApiServer::new(
        ApiConfig::new(config.server.host.clone(), config.server.port),
        service.clone(),
    );
    let result = server.run(shutdown).await;

    service.shutdown();
    result
}
