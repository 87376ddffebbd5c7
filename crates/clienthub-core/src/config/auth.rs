//! Sign-in and session configuration.

use serde::{Deserialize, Serialize};

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub session_cookie: String,

    /// Session lifetime in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Admin account created on startup when no users exist.
    #[serde(default)]
    pub bootstrap_admin: BootstrapAdmin,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie: default_cookie_name(),
            session_ttl_hours: default_session_ttl_hours(),
            bootstrap_admin: BootstrapAdmin::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    #[serde(default = "default_admin_email")]
    pub email: String,

    #[serde(default = "default_admin_name")]
    pub full_name: String,

    /// Password in plain text. Prefer `password_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the password.
    #[serde(default = "default_admin_password_env")]
    pub password_env: Option<String>,
}

impl Default for BootstrapAdmin {
    fn default() -> Self {
        Self {
            email: default_admin_email(),
            full_name: default_admin_name(),
            password: None,
            password_env: default_admin_password_env(),
        }
    }
}

impl BootstrapAdmin {
    /// Get the password, checking `password_env` first.
    pub fn resolve_password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var) {
                return Some(password);
            }
        self.password.clone()
    }
}

fn default_cookie_name() -> String {
    "clienthub_session".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_admin_email() -> String {
    "admin@clienthub.local".to_string()
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_admin_password_env() -> Option<String> {
    Some("CLIENTHUB_ADMIN_PASSWORD".to_string())
}
