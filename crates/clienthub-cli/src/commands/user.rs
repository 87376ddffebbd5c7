//! `clienthub create-user` command implementation.

use anyhow::{Context, Result};
use clienthub_auth::{AuthService, CreateUser};
use std::path::Path;
use std::sync::Arc;

use super::{connect_database, load_config};

pub async fn run(
    config_path: &Path,
    email: &str,
    password: &str,
    full_name: &str,
    role: &str,
) -> Result<()> {
    let config = load_config(config_path)?;
    let repo = connect_database(&config).await?;
    let auth = AuthService::new(Arc::new(repo), &config.auth);

    let user = auth
        .create_user(CreateUser {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            role: role.to_string(),
        })
        .await
        .with_context(|| format!("Failed to create user {email}"))?;

    let role_label = user.role().map(|r| r.label()).unwrap_or("Unknown");
    println!("✅ Created {} user {}", role_label, user.email);
    println!("   id: {}", user.id);
    Ok(())
}
