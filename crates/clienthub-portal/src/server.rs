//! Portal server implementation.

use clienthub_core::config::ServerConfig;
use tokio::net::TcpListener;

use crate::error::PortalError;
use crate::routes;
use crate::state::AppState;

/// The portal HTTP server.
pub struct PortalServer {
    config: ServerConfig,
    state: AppState,
}

impl PortalServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until Ctrl-C.
    pub async fn run(&self) -> Result<(), PortalError> {
        let addr = self.config.bind_address();
        let app = routes::create_router(self.state.clone());

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| PortalError::StartupFailed(format!("{addr}: {e}")))?;
        tracing::info!(address = %addr, "ClientHub portal listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| PortalError::StartupFailed(e.to_string()))?;

        tracing::info!("ClientHub portal stopped");
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        self.config.bind_address()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clienthub_core::ClientHubConfig;
    use clienthub_store::{MemoryBlobStore, MemoryRepository};
    use std::sync::Arc;

    #[test]
    fn test_server_creation() {
        let config = ClientHubConfig::default();
        let state = AppState::new(
            config.clone(),
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryBlobStore::new()),
        );
        let server = PortalServer::new(config.server, state);
        assert_eq!(server.bind_address(), "0.0.0.0:8080");
    }
}
