pub mod health;
pub mod routes;

use crate::client::IngestDispatcher;
use crate::{Config, Error, Result};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use health::HealthStatus;
pub use routes::{router, ApiError, IngestRequest};

pub struct Server {
    config: Arc<Config>,
    dispatcher: Arc<IngestDispatcher>,
    cancellation_token: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(config: Config, dispatcher: IngestDispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let host = self.config.server.host.as_str();
        let port = self.config.server.port;
        let listener = tokio::net::TcpListener::bind((host, port))
            .await
            .map_err(|e| Error::Service(format!("Failed to bind {host}:{port}: {e}")))?;
        let addr = listener.local_addr()?;
        info!(
            "Serving {} providers on http://{}",
            self.dispatcher.providers().len(),
            addr
        );

        // Setup signal handlers
        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown_token.cancel();
        });

        let app = router(Arc::clone(&self.dispatcher));
        let token = self.cancellation_token.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await });

        let shutdown_timeout =
            std::time::Duration::from_secs(self.config.server.graceful_shutdown_timeout_secs);
        let mut server = tokio::spawn(async move { serve.await });

        let server_result = tokio::select! {
            result = &mut server => result,
            () = self.cancellation_token.cancelled() => {
                info!("Shutdown signal received, draining in-flight requests");
                match tokio::time::timeout(shutdown_timeout, &mut server).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Graceful shutdown timeout exceeded, forcing shutdown");
                        server.abort();
                        return Ok(());
                    }
                }
            }
        };

        server_result
            .map_err(|e| Error::Service(format!("Server task failed: {e}")))?
            .map_err(|e| Error::Service(format!("HTTP server error: {e}")))?;

        info!("HTTP server shutdown complete");
        Ok(())
    }

    pub fn shutdown(&self) {
        warn!("Initiating server shutdown");
        self.cancellation_token.cancel();
    }

    /// Check if the server has been requested to shutdown
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let terminate = signal::unix::signal(signal::unix::SignalKind::terminate());
        let interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt());
        match (terminate, interrupt) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
                    _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
                }
            }
            _ => {
                warn!("Failed to install unix signal handlers, falling back to ctrl-c");
                if signal::ctrl_c().await.is_ok() {
                    info!("Received ctrl-c, initiating graceful shutdown");
                }
            }
        }
    }

    #[cfg(not(unix))]
    if signal::ctrl_c().await.is_ok() {
        info!("Received ctrl-c, initiating graceful shutdown");
    }
}
