//! JSON endpoints and health check.

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use serde_json::json;

use crate::session;
use crate::state::AppState;

/// `GET /healthz`
pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true, "service": "clienthub" }))
}

pub mod api {
    use super::*;
    use crate::api_types::*;
    use crate::error::ACCESS_DENIED;
    use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Response};
    use clienthub_auth::{AuthError, CreateUser};
    use clienthub_core::model::Role;
    use clienthub_core::onboarding::{ClientStatus, current_step, derive_steps, progress_percentage};

    use crate::session::CurrentUser;

    fn error(status: StatusCode, message: impl Into<String>) -> Response {
        (status, Json(ErrorResponse::new(message))).into_response()
    }

    /// Resolve the caller and require a role, as a JSON error on failure.
    async fn require(state: &AppState, headers: &HeaderMap, role: Role) -> Result<CurrentUser, Response> {
        match session::resolve(state, headers).await {
            Ok(Some(current)) if current.role == role => Ok(current),
            Ok(Some(_)) => Err(error(StatusCode::FORBIDDEN, ACCESS_DENIED)),
            Ok(None) => Err(error(StatusCode::UNAUTHORIZED, "Unauthorized")),
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve session");
                Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"))
            }
        }
    }

    /// `POST /api/users/create` (admin only).
    pub async fn create_user(
        State(state): State<AppState>,
        headers: HeaderMap,
        body: Result<Json<CreateUserRequest>, JsonRejection>,
    ) -> Response {
        let admin = match require(&state, &headers, Role::Admin).await {
            Ok(admin) => admin,
            Err(response) => return response,
        };
        let Json(request) = match body {
            Ok(body) => body,
            Err(rejection) => return error(StatusCode::BAD_REQUEST, rejection.body_text()),
        };
        if request.email.trim().is_empty() || request.password.is_empty() || request.role.trim().is_empty() {
            return error(StatusCode::BAD_REQUEST, "email, password and role are required");
        }

        let result = state
            .auth()
            .create_user(CreateUser {
                email: request.email,
                password: request.password,
                full_name: request.full_name,
                role: request.role,
            })
            .await;

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, admin = %admin.user.id, "Created user via API");
                Json(CreateUserResponse {
                    message: "User created successfully".to_string(),
                    user_id: user.id,
                })
                .into_response()
            }
            Err(AuthError::InvalidInput(message)) => error(StatusCode::BAD_REQUEST, message),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create user");
                error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }

    /// `GET /api/onboarding` (client only): steps and percentage for the caller.
    pub async fn onboarding(State(state): State<AppState>, headers: HeaderMap) -> Response {
        let current = match require(&state, &headers, Role::Client).await {
            Ok(current) => current,
            Err(response) => return response,
        };
        let documents = match state.repo().list_documents_by_uploader(current.user.id).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!(error = %e, user_id = %current.user.id, "Failed to load documents");
                return error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };

        let steps = derive_steps(&documents);
        Json(OnboardingResponse {
            percentage: progress_percentage(&steps),
            completed_steps: steps.iter().filter(|s| s.is_done()).count(),
            total_steps: steps.len(),
            current_step: current_step(&steps).map(|s| s.step),
            status: ClientStatus::derive(&documents, &steps),
            steps: steps.iter().map(StepResponse::from).collect(),
        })
        .into_response()
    }
}
