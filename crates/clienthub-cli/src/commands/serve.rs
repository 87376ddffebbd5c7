//! `clienthub serve` command implementation.

use anyhow::{Context, Result};
use clienthub_auth::{AuthService, bootstrap_admin};
use clienthub_core::ClientHubConfig;
use clienthub_portal::{AppState, PortalServer};
use clienthub_store::{MemoryRepository, Repository, create_blob_store};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{connect_database, load_config};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Command-line overrides for `serve`.
#[derive(Debug, Default)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub memory: bool,
}

pub async fn run(config_path: &Path, options: ServeOptions) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = options.host {
        config.server.host = host;
    }
    if let Some(port) = options.port {
        config.server.port = port;
    }

    let repo = open_repository(&config, options.memory).await?;
    let blobs = create_blob_store(&config.storage);
    info!(
        backend = ?config.storage.backend,
        bucket = %config.storage.bucket,
        "Document storage ready"
    );

    let server_config = config.server.clone();
    let admin = config.auth.bootstrap_admin.clone();
    let state = AppState::new(config, repo, blobs);

    bootstrap_admin(state.auth(), &admin)
        .await
        .context("Failed to create bootstrap admin")?;

    spawn_session_sweeper(state.auth().clone());

    PortalServer::new(server_config, state)
        .run()
        .await
        .context("Portal server failed")?;
    Ok(())
}

async fn open_repository(config: &ClientHubConfig, memory: bool) -> Result<Arc<dyn Repository>> {
    if memory {
        warn!("Using in-memory repository; all accounts and documents are lost on exit");
        return Ok(Arc::new(MemoryRepository::new()));
    }
    let repo = connect_database(config).await?;
    info!(
        max_connections = config.upstream.max_connections,
        migrations = config.upstream.run_migrations,
        "Connected to Postgres"
    );
    Ok(Arc::new(repo))
}

fn spawn_session_sweeper(auth: AuthService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match auth.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Purged expired sessions"),
                Err(e) => warn!(error = %e, "Failed to purge expired sessions"),
            }
        }
    });
}
