//! Shared types for ClientHub: configuration, domain records and the
//! onboarding progress derivation used by every dashboard.

pub mod config;
pub mod model;
pub mod onboarding;

pub use config::{ClientHubConfig, ConfigError};
pub use model::{
    Client, Document, DocumentStatus, NewDocument, NewUser, Role, Session, User, format_file_size,
};
pub use onboarding::{
    ClientFilter, ClientOverview, ClientStatus, OnboardingStep, StepProgress, current_step,
    derive_steps, display_percentage, progress_percentage,
};
