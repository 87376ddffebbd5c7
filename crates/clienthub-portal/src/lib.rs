//! # clienthub-portal
//!
//! Role-scoped web portal for client onboarding.
//!
//! - Clients upload documents and follow their four onboarding steps
//! - Admins manage clients, users and document decisions
//! - Service-center staff verify submissions and work the review queue
//!
//! ## Tech Stack
//!
//! - Axum for HTTP, with one session guard per role area
//! - Server-rendered HTML styled with Tailwind CSS and Alpine.js
//! - Stylesheet bundled via `rust-embed`

pub mod api_types;
pub mod assets;
pub mod error;
pub mod handlers;
pub mod login;
pub mod pages;
pub mod pages_admin;
pub mod pages_service;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;
pub mod templates;
pub mod upload;

pub use error::PortalError;
pub use routes::create_router;
pub use server::PortalServer;
pub use session::CurrentUser;
pub use state::AppState;
