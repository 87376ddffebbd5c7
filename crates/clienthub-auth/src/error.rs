//! Error types for the auth crate.

use clienthub_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Both produce the same message.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account's stored role is not one the portal knows.
    #[error("Unable to retrieve user role.")]
    UnknownRole,

    /// Rejected input when creating a user, including a duplicate email.
    #[error("{0}")]
    InvalidInput(String),

    /// The session expiry cannot be represented.
    #[error("session lifetime is out of range")]
    SessionLifetime,

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AuthError::InvalidInput(msg),
            other => AuthError::Store(other),
        }
    }
}
