//! Error types for the portal crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clienthub_auth::AuthError;
use clienthub_store::StoreError;
use thiserror::Error;

/// Body sent with every role mismatch, for pages and the JSON API alike.
pub const ACCESS_DENIED: &str = "Access denied";

/// Errors that can occur while serving the portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Failed to start the server.
    #[error("failed to start portal: {0}")]
    StartupFailed(String),

    /// No valid session.
    #[error("authentication required")]
    AuthenticationFailed,

    /// Session role does not match the page.
    #[error("Access denied")]
    AccessDenied,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request.
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PortalError {
    pub fn status(&self) -> StatusCode {
        match self {
            PortalError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            PortalError::AccessDenied => StatusCode::FORBIDDEN,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PortalError::Auth(AuthError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            PortalError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            PortalError::Auth(AuthError::UnknownRole) => StatusCode::FORBIDDEN,
            PortalError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            PortalError::Store(StoreError::Conflict(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, self.public_message()).into_response()
    }
}
