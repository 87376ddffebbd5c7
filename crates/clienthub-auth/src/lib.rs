//! Authentication for ClientHub.
//!
//! Accounts are a profile row plus an Argon2 credential. Signing in opens a
//! server-side session identified by a random token that the portal keeps in
//! a cookie.

pub mod bootstrap;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use bootstrap::bootstrap_admin;
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use service::{AuthService, CreateUser, MIN_PASSWORD_LEN, SignedIn};
pub use token::generate_session_token;
