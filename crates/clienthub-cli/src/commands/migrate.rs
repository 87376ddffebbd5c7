//! `clienthub migrate` command implementation.

use anyhow::{Context, Result};
use clienthub_store::PgRepository;
use std::path::Path;

use super::load_config;

pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("🔌 Connecting to database...");
    let repo = PgRepository::connect(&config.upstream)
        .await
        .context("Failed to connect to Postgres")?;

    println!("  📋 Applying migrations...");
    repo.migrate().await.context("Failed to apply migrations")?;

    println!("✅ Database schema is up to date");
    Ok(())
}
