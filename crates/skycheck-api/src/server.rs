//! HTTP server bootstrap.

use std::sync::Arc;

use skycheck_jobs::CheckInService;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::routes::create_router;

/// Bind address.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl ApiConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Serves the check-in routes until `shutdown` is cancelled.
pub struct ApiServer {
    config: ApiConfig,
    service: Arc<CheckInService>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, service: Arc<CheckInService>) -> Self {
        Self { config, service }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Bind and serve. In-flight requests drain after `shutdown` fires.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), Box<dyn std::error::Error>> {
        let app = create_router(self.service.clone());

        let listener = TcpListener::bind(self.addr()).await?;

        info!("skycheck API listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("skycheck API stopped");
        Ok(())
    }
}
