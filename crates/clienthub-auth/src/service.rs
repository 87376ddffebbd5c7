//! Sign-in, session restore and user provisioning.

use chrono::{Duration, Utc};
use clienthub_core::config::{AuthConfig, MAX_SESSION_TTL_HOURS};
use clienthub_core::model::{NewUser, Role, Session, User};
use clienthub_store::Repository;
use std::sync::Arc;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::token::generate_session_token;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub role: Role,
    pub session: Session,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Raw role string, normalized through [`Role::normalize`].
    pub role: String,
}

/// Issues and checks sessions against the repository.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn Repository>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: Arc<dyn Repository>, config: &AuthConfig) -> Self {
        Self {
            repo,
            session_ttl: Duration::hours(config.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS)),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn user_count(&self) -> Result<i64, AuthError> {
        Ok(self.repo.count_users().await?)
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = email.trim();
        let Some((user, hash)) = self.repo.credentials_by_email(email).await? else {
            tracing::info!(email, "Sign-in failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &hash) {
            tracing::info!(email, "Sign-in failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        let Some(role) = user.role() else {
            tracing::warn!(user_id = %user.id, role = %user.role, "Sign-in refused: unknown role");
            return Err(AuthError::UnknownRole);
        };

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.session_ttl)
            .ok_or(AuthError::SessionLifetime)?;
        let session = Session {
            token: generate_session_token(),
            user_id: user.id,
            created_at: now,
            expires_at,
        };
        self.repo.create_session(session.clone()).await?;
        tracing::info!(user_id = %user.id, role = %role, "Signed in");

        Ok(SignedIn {
            user,
            role,
            session,
        })
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted and yield `None`, as do sessions whose
    /// user no longer exists.
    pub async fn restore(&self, token: &str) -> Result<Option<User>, AuthError> {
        let Some(session) = self.repo.get_session(token).await? else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            tracing::debug!(user_id = %session.user_id, "Session expired");
            self.repo.delete_session(token).await?;
            return Ok(None);
        }
        Ok(self.repo.get_user(session.user_id).await?)
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.repo.delete_session(token).await?;
        Ok(())
    }

    /// Delete every session past its expiry. Returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        Ok(self.repo.delete_expired_sessions(Utc::now()).await?)
    }

    /// Create an account with a credential and profile.
    ///
    /// Client accounts also get a client record named after the user.
    pub async fn create_user(&self, input: CreateUser) -> Result<User, AuthError> {
        let email = input.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput(
                "A valid email address is required".to_string(),
            ));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let Some(role) = Role::normalize(&input.role) else {
            return Err(AuthError::InvalidInput(format!(
                "Unknown role: {}",
                input.role
            )));
        };

        let hash = hash_password(&input.password)?;
        let full_name = input.full_name.trim().to_string();
        let user = self
            .repo
            .create_user(
                NewUser {
                    email,
                    full_name,
                    role,
                },
                hash,
            )
            .await?;

        if role == Role::Client {
            let client = self
                .repo
                .create_client(user.display_name(), Some(user.id))
                .await?;
            tracing::info!(user_id = %user.id, client_id = %client.id, "Provisioned client record");
        }

        tracing::info!(user_id = %user.id, email = %user.email, role = %role, "Created user");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clienthub_store::MemoryRepository;

    fn service() -> (AuthService, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        let service = AuthService::new(repo.clone(), &AuthConfig::default());
        (service, repo)
    }

    fn client_input(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password: "demo123".to_string(),
            full_name: "John Smith".to_string(),
            role: "Client".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_and_restore() {
        let (auth, _) = service();
        let user = auth.create_user(client_input("client@demo.com")).await.unwrap();

        let signed_in = auth.sign_in("client@demo.com", "demo123").await.unwrap();
        assert_eq!(signed_in.user.id, user.id);
        assert_eq!(signed_in.role, Role::Client);
        assert_eq!(
            signed_in.session.expires_at - signed_in.session.created_at,
            Duration::hours(24)
        );

        let restored = auth.restore(&signed_in.session.token).await.unwrap();
        assert_eq!(restored.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_fail_alike() {
        let (auth, _) = service();
        auth.create_user(client_input("client@demo.com")).await.unwrap();

        let wrong = auth.sign_in("client@demo.com", "nope").await.unwrap_err();
        let unknown = auth.sign_in("ghost@demo.com", "demo123").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let (auth, repo) = service();
        let auth = auth.with_session_ttl(Duration::seconds(-1));
        auth.create_user(client_input("client@demo.com")).await.unwrap();
        let signed_in = auth.sign_in("client@demo.com", "demo123").await.unwrap();

        assert!(auth.restore(&signed_in.session.token).await.unwrap().is_none());
        assert!(
            repo.get_session(&signed_in.session.token)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_sign_out_ends_session() {
        let (auth, _) = service();
        auth.create_user(client_input("client@demo.com")).await.unwrap();
        let signed_in = auth.sign_in("client@demo.com", "demo123").await.unwrap();

        auth.sign_out(&signed_in.session.token).await.unwrap();
        assert!(auth.restore(&signed_in.session.token).await.unwrap().is_none());
        // signing out twice is harmless
        auth.sign_out(&signed_in.session.token).await.unwrap();
    }

    #[test]
    fn test_configured_ttl_is_clamped() {
        let repo = Arc::new(MemoryRepository::new());
        let config = AuthConfig {
            session_ttl_hours: 9_000_000_000_000_000,
            ..AuthConfig::default()
        };
        let auth = AuthService::new(repo, &config);
        assert_eq!(auth.session_ttl(), Duration::hours(MAX_SESSION_TTL_HOURS));
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_fails_sign_in() {
        let (auth, _) = service();
        auth.create_user(client_input("client@demo.com")).await.unwrap();
        let auth = auth.with_session_ttl(Duration::MAX);

        let err = auth.sign_in("client@demo.com", "demo123").await.unwrap_err();
        assert!(matches!(err, AuthError::SessionLifetime));
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired_sessions() {
        let (auth, repo) = service();
        auth.create_user(client_input("client@demo.com")).await.unwrap();
        let live = auth.sign_in("client@demo.com", "demo123").await.unwrap();
        let stale = auth
            .clone()
            .with_session_ttl(Duration::seconds(-1))
            .sign_in("client@demo.com", "demo123")
            .await
            .unwrap();

        assert_eq!(auth.purge_expired_sessions().await.unwrap(), 1);
        assert!(repo.get_session(&stale.session.token).await.unwrap().is_none());
        assert!(repo.get_session(&live.session.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_client_provisions_client_record() {
        let (auth, repo) = service();
        let user = auth.create_user(client_input("client@demo.com")).await.unwrap();
        let client = repo.find_client_by_owner(user.id).await.unwrap().unwrap();
        assert_eq!(client.business_name, "John Smith");
    }

    #[tokio::test]
    async fn test_create_staff_has_no_client_record() {
        let (auth, repo) = service();
        let user = auth
            .create_user(CreateUser {
                role: "Service_Center".to_string(),
                ..client_input("service@center.com")
            })
            .await
            .unwrap();
        assert_eq!(user.role(), Some(Role::ServiceCenter));
        assert!(repo.find_client_by_owner(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let (auth, _) = service();

        let bad_email = auth.create_user(client_input("not-an-email")).await;
        assert!(matches!(bad_email, Err(AuthError::InvalidInput(_))));

        let short = auth
            .create_user(CreateUser {
                password: "123".to_string(),
                ..client_input("a@b.com")
            })
            .await;
        assert!(matches!(short, Err(AuthError::InvalidInput(_))));

        let bad_role = auth
            .create_user(CreateUser {
                role: "superuser".to_string(),
                ..client_input("a@b.com")
            })
            .await;
        assert!(matches!(bad_role, Err(AuthError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_invalid_input() {
        let (auth, _) = service();
        auth.create_user(client_input("client@demo.com")).await.unwrap();
        let err = auth
            .create_user(client_input("CLIENT@demo.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_role_change_applies_to_next_sign_in() {
        let (auth, repo) = service();
        let user = auth.create_user(client_input("client@demo.com")).await.unwrap();
        repo.update_user_role(user.id, Role::Admin).await.unwrap();
        let signed_in = auth.sign_in("client@demo.com", "demo123").await.unwrap();
        assert_eq!(signed_in.role, Role::Admin);
    }
}
