//! First-run admin account.

use clienthub_core::config::BootstrapAdmin;
use clienthub_core::model::Role;

use crate::error::AuthError;
use crate::service::{AuthService, CreateUser};

/// On startup, if the user table is empty, create the configured admin.
///
/// Password source (highest precedence first):
/// - env var named by `auth.bootstrap_admin.password_env`
/// - `auth.bootstrap_admin.password`
///
/// Returns `true` when an account was created.
pub async fn bootstrap_admin(
    auth: &AuthService,
    admin: &BootstrapAdmin,
) -> Result<bool, AuthError> {
    if auth.user_count().await? > 0 {
        return Ok(false);
    }

    let Some(password) = admin.resolve_password().filter(|p| !p.trim().is_empty()) else {
        tracing::warn!(
            password_env = admin.password_env.as_deref().unwrap_or(""),
            "No users exist and no bootstrap admin password is configured; sign-in is impossible until a user is created"
        );
        return Ok(false);
    };

    let user = auth
        .create_user(CreateUser {
            email: admin.email.clone(),
            password,
            full_name: admin.full_name.clone(),
            role: Role::Admin.as_str().to_string(),
        })
        .await?;

    tracing::warn!(email = %user.email, "Bootstrapped admin user (password taken from env/config)");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clienthub_core::config::AuthConfig;
    use clienthub_store::{MemoryRepository, Repository};
    use std::sync::Arc;

    fn admin_with_password(password: Option<&str>) -> BootstrapAdmin {
        BootstrapAdmin {
            email: "admin@gentyx.com".to_string(),
            full_name: "Sarah Johnson".to_string(),
            password: password.map(str::to_string),
            password_env: None,
        }
    }

    #[tokio::test]
    async fn test_creates_admin_when_empty() {
        let repo = Arc::new(MemoryRepository::new());
        let auth = AuthService::new(repo.clone(), &AuthConfig::default());

        let created = bootstrap_admin(&auth, &admin_with_password(Some("demo123")))
            .await
            .unwrap();
        assert!(created);

        let signed_in = auth.sign_in("admin@gentyx.com", "demo123").await.unwrap();
        assert_eq!(signed_in.role, Role::Admin);
        assert!(repo.find_client_by_owner(signed_in.user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skips_when_users_exist() {
        let repo = Arc::new(MemoryRepository::new());
        let auth = AuthService::new(repo.clone(), &AuthConfig::default());
        bootstrap_admin(&auth, &admin_with_password(Some("demo123")))
            .await
            .unwrap();

        let created = bootstrap_admin(&auth, &admin_with_password(Some("other123")))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_skips_without_password() {
        let repo = Arc::new(MemoryRepository::new());
        let auth = AuthService::new(repo.clone(), &AuthConfig::default());
        let created = bootstrap_admin(&auth, &admin_with_password(None)).await.unwrap();
        assert!(!created);
        assert_eq!(repo.count_users().await.unwrap(), 0);
    }
}
