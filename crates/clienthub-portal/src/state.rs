//! Portal application state.

use clienthub_auth::AuthService;
use clienthub_core::ClientHubConfig;
use clienthub_core::config::PortalConfig;
use clienthub_store::{BlobStore, Repository};
use std::sync::Arc;

/// Shared application state for the portal.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientHubConfig,
    repo: Arc<dyn Repository>,
    blobs: Arc<dyn BlobStore>,
    auth: AuthService,
}

impl AppState {
    pub fn new(
        config: ClientHubConfig,
        repo: Arc<dyn Repository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let auth = AuthService::new(repo.clone(), &config.auth);
        Self::with_auth(config, repo, blobs, auth)
    }

    /// Build state around a preconfigured auth service.
    pub fn with_auth(
        config: ClientHubConfig,
        repo: Arc<dyn Repository>,
        blobs: Arc<dyn BlobStore>,
        auth: AuthService,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                repo,
                blobs,
                auth,
            }),
        }
    }

    pub fn config(&self) -> &ClientHubConfig {
        &self.inner.config
    }

    pub fn portal(&self) -> &PortalConfig {
        &self.inner.config.portal
    }

    pub fn repo(&self) -> &Arc<dyn Repository> {
        &self.inner.repo
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.inner.blobs
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Name of the session cookie.
    pub fn session_cookie(&self) -> &str {
        &self.inner.config.auth.session_cookie
    }
}
