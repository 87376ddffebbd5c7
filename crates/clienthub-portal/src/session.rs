//! Session cookies, the signed-in user extractor and per-role guards.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use clienthub_core::model::{Role, User};

use crate::error::PortalError;
use crate::state::AppState;

/// The user behind the request's session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub role: Role,
    pub token: String,
}

/// Extract a named cookie value from the request headers.
pub fn extract_session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(prefix.as_str())
                .filter(|value| !value.is_empty())
        })
        .map(str::to_string)
}

/// `Set-Cookie` value for a new session.
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64) -> String {
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Login URL that returns to `target` after sign-in.
pub fn login_redirect(target: &str) -> String {
    format!("/?redirect={}", urlencoding::encode(target))
}

/// Resolve the session cookie to a user with a known role.
///
/// Missing, expired or unknown tokens and users whose stored role is not
/// recognised all yield `None`.
pub async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Option<CurrentUser>, PortalError> {
    let Some(token) = extract_session_cookie(headers, state.session_cookie()) else {
        return Ok(None);
    };
    let Some(user) = state.auth().restore(&token).await? else {
        return Ok(None);
    };
    let Some(role) = user.role() else {
        tracing::warn!(user_id = %user.id, role = %user.role, "Session user has unknown role");
        return Ok(None);
    };
    Ok(Some(CurrentUser { user, role, token }))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }
        resolve(state, &parts.headers)
            .await?
            .ok_or(PortalError::AuthenticationFailed)
    }
}

/// Guard for `/client` pages.
pub async fn require_client(State(state): State<AppState>, request: Request, next: Next) -> Response {
    guard(Role::Client, state, request, next).await
}

/// Guard for `/admin` pages.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    guard(Role::Admin, state, request, next).await
}

/// Guard for `/service-center` pages.
pub async fn require_service_center(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    guard(Role::ServiceCenter, state, request, next).await
}

async fn guard(required: Role, state: AppState, mut request: Request, next: Next) -> Response {
    let current = match resolve(&state, request.headers()).await {
        Ok(current) => current,
        Err(e) => return e.into_response(),
    };

    let Some(current) = current else {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        return Redirect::to(&login_redirect(target)).into_response();
    };

    if current.role != required {
        tracing::warn!(
            user_id = %current.user.id,
            role = %current.role,
            required = %required,
            path = %request.uri().path(),
            "Access denied"
        );
        return PortalError::AccessDenied.into_response();
    }

    request.extensions_mut().insert(current);
    next.run(request).await
}
