//! CLI command implementations for the ClientHub server.

pub mod check;
pub mod migrate;
pub mod serve;
pub mod user;

use anyhow::{Context, Result};
use clienthub_core::ClientHubConfig;
use clienthub_store::PgRepository;
use std::path::Path;

/// Load the configuration file, or the defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<ClientHubConfig> {
    if !path.exists() {
        tracing::warn!(
            config = %path.display(),
            "Configuration file not found; using defaults"
        );
        return Ok(ClientHubConfig::default());
    }
    let config = ClientHubConfig::from_file(path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    tracing::info!(config = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Connect to Postgres, applying migrations when `upstream.run_migrations` is set.
pub async fn connect_database(config: &ClientHubConfig) -> Result<PgRepository> {
    let repo = PgRepository::connect(&config.upstream)
        .await
        .context("Failed to connect to Postgres")?;
    if config.upstream.run_migrations {
        repo.migrate().await.context("Failed to apply migrations")?;
    }
    Ok(repo)
}
