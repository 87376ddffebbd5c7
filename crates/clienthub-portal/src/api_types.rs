//! API request and response types.

use chrono::{DateTime, Utc};
use clienthub_core::onboarding::{ClientStatus, OnboardingStep, StepProgress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// User Provisioning Types
// =============================================================================

/// Body of `POST /api/users/create`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

/// Error body shared by the JSON endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// Onboarding Types
// =============================================================================

/// One step in `GET /api/onboarding`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StepResponse {
    pub step: OnboardingStep,
    pub title: String,
    pub description: String,
    pub status: String,
    pub completed: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<&StepProgress> for StepResponse {
    fn from(progress: &StepProgress) -> Self {
        Self {
            step: progress.step,
            title: progress.step.title().to_string(),
            description: progress.step.description().to_string(),
            status: progress.status.as_str().to_string(),
            completed: progress.is_done(),
            last_updated: progress.last_updated,
        }
    }
}

/// Response for `GET /api/onboarding`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardingResponse {
    pub percentage: f64,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub current_step: Option<OnboardingStep>,
    pub status: ClientStatus,
    pub steps: Vec<StepResponse>,
}
