//! Configuration types for the ClientHub portal.
//!
//! Configuration is loaded from a single YAML file (`clienthub.yaml`). Every
//! section is optional and falls back to its defaults, so an empty file yields
//! a runnable development setup (given a reachable database).
//!
//! # Sections
//!
//! - **upstream**: Postgres connection holding users, clients and documents
//! - **server**: HTTP bind address
//! - **storage**: where uploaded files are kept
//! - **auth**: session cookie, lifetime and the bootstrap admin
//! - **portal**: branding shown on the settings page and upload limits

pub mod auth;
pub mod database;
pub mod portal;
pub mod server;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use auth::{AuthConfig, BootstrapAdmin, MAX_SESSION_TTL_HOURS};
pub use database::DatabaseConfig;
pub use portal::PortalConfig;
pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};

/// Complete ClientHub configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientHubConfig {
    /// Postgres connection.
    #[serde(default, alias = "database")]
    pub upstream: DatabaseConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub portal: PortalConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientHubConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the server unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::Config(format!(
                "auth.session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"
            )));
        }
        if self.auth.session_cookie.trim().is_empty() {
            return Err(ConfigError::Config(
                "auth.session_cookie must not be empty".to_string(),
            ));
        }
        if self.portal.max_upload_bytes == 0 {
            return Err(ConfigError::Config(
                "portal.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.portal.document_types.is_empty() {
            return Err(ConfigError::Config(
                "portal.document_types must list at least one type".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = ClientHubConfig::from_yaml("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upstream.database, "clienthub");
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.auth.session_cookie, "clienthub_session");
        assert_eq!(config.auth.session_ttl_hours, 24);
        assert_eq!(config.portal.company_name, "Gentyx ClientHub");
        assert_eq!(config.portal.support_email, "support@gentyx.com");
        assert_eq!(config.portal.timezone, "UTC");
        assert_eq!(config.portal.accept_attribute(), ".pdf,.doc,.docx");
        assert_eq!(config.portal.max_upload_megabytes(), 10);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
upstream:
  host: db.internal
  port: 6432
  database: hub
  username: hub_app
  password_env: HUB_DB_PASSWORD
server:
  host: 127.0.0.1
  port: 3000
storage:
  backend: memory
  bucket: uploads
auth:
  session_cookie: hub_sid
  session_ttl_hours: 8
  bootstrap_admin:
    email: root@example.com
    password_env: HUB_ADMIN_PASSWORD
portal:
  company_name: Acme Onboarding
  max_upload_bytes: 1048576
"#;
        let config = ClientHubConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.upstream.host, "db.internal");
        assert_eq!(config.upstream.port, 6432);
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.bucket, "uploads");
        assert_eq!(config.auth.session_cookie, "hub_sid");
        assert_eq!(config.auth.session_ttl_hours, 8);
        assert_eq!(config.auth.bootstrap_admin.email, "root@example.com");
        assert_eq!(config.portal.company_name, "Acme Onboarding");
        assert_eq!(config.portal.max_upload_megabytes(), 1);
        // untouched fields keep their defaults
        assert_eq!(config.portal.timezone, "UTC");
    }

    #[test]
    fn test_database_alias() {
        let yaml = "database:\n  database_url: postgres://u@h/db\n";
        let config = ClientHubConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.upstream.connection_string(), "postgres://u@h/db");
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let err = ClientHubConfig::from_yaml("auth:\n  session_ttl_hours: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn test_rejects_ttl_beyond_one_year() {
        let err = ClientHubConfig::from_yaml("auth:\n  session_ttl_hours: 9000000000000000\n")
            .unwrap_err();
        assert!(err.to_string().contains("session_ttl_hours"));
        assert!(ClientHubConfig::from_yaml("auth:\n  session_ttl_hours: 8760\n").is_ok());
        assert!(ClientHubConfig::from_yaml("auth:\n  session_ttl_hours: 8761\n").is_err());
    }

    #[test]
    fn test_rejects_invalid_yaml() {
        let err = ClientHubConfig::from_yaml("server: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clienthub.yaml");
        std::fs::write(&path, "server:\n  port: 9000\n").unwrap();
        let config = ClientHubConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_bootstrap_password_prefers_env() {
        let admin = BootstrapAdmin {
            password: Some("from-file".to_string()),
            password_env: Some("CLIENTHUB_TEST_BOOTSTRAP_PW_UNSET".to_string()),
            ..BootstrapAdmin::default()
        };
        assert_eq!(admin.resolve_password().as_deref(), Some("from-file"));
    }
}
