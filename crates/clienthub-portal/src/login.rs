//! Login page, sign-in form handling and logout.

use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use clienthub_auth::AuthError;
use clienthub_core::model::Role;
use serde::Deserialize;

use crate::session::{self, clear_session_cookie, extract_session_cookie, session_cookie};
use crate::state::AppState;
use crate::templates::{auth_layout, html_escape};

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Where to send a user after sign-in.
///
/// A requested target is honoured only when it is a local path inside the
/// role's own area; anything else falls back to the role home.
pub fn post_login_target(requested: Option<&str>, role: Role) -> String {
    local_target(requested, role.home_path(), role.home_path())
}

/// Whether `target` is a same-site path at or below `area`.
pub fn is_within(target: &str, area: &str) -> bool {
    let local = target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.split(['/', '?']).any(|segment| segment == "..");
    local
        && target
            .strip_prefix(area)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}

/// `requested` if it lies within `area`, otherwise `fallback`.
pub fn local_target(requested: Option<&str>, area: &str, fallback: &str) -> String {
    requested
        .map(str::trim)
        .filter(|t| is_within(t, area))
        .unwrap_or(fallback)
        .to_string()
}

fn error_message(code: &str) -> &'static str {
    match code {
        "invalid" => "Invalid email or password",
        "role" => "Unable to retrieve user role.",
        _ => "Something went wrong. Please try again.",
    }
}

/// `GET /`: the login page, or the role home for signed-in visitors.
pub async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Response {
    match session::resolve(&state, &headers).await {
        Ok(Some(current)) => return Redirect::to(current.role.home_path()).into_response(),
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, "Failed to check existing session"),
    }

    let portal = state.portal();
    let error_html = query
        .error
        .as_deref()
        .map(|code| {
            format!(
                r##"<div class="mb-4 flex items-center gap-2 px-4 py-3 rounded-lg bg-red-50 border border-red-200 text-red-700 text-sm">
                    <i class="fas fa-exclamation-circle"></i>
                    <span>{}</span>
                </div>"##,
                error_message(code)
            )
        })
        .unwrap_or_default();
    let redirect = html_escape(query.redirect.as_deref().unwrap_or(""));

    let content = format!(
        r##"<div class="bg-white rounded-xl shadow-sm border border-gray-200 p-8">
            <h2 class="text-xl font-semibold text-gray-900">Sign in</h2>
            <p class="text-sm text-gray-500 mt-1 mb-6">{description}</p>
            {error_html}
            <form method="post" action="/login" class="space-y-4">
                <input type="hidden" name="redirect" value="{redirect}">
                <div class="space-y-1">
                    <label for="email" class="block text-sm font-medium text-gray-700">Email</label>
                    <input type="email" name="email" id="email" required autocomplete="username"
                           class="w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-primary-500 focus:border-primary-500">
                </div>
                <div class="space-y-1">
                    <label for="password" class="block text-sm font-medium text-gray-700">Password</label>
                    <input type="password" name="password" id="password" required autocomplete="current-password"
                           class="w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-primary-500 focus:border-primary-500">
                </div>
                <button type="submit" class="w-full bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">
                    Sign in
                </button>
            </form>
            <p class="text-xs text-gray-500 text-center mt-6">Need help? Contact <a href="mailto:{support}" class="text-primary-600">{support}</a></p>
        </div>"##,
        description = html_escape(&portal.company_description),
        support = html_escape(&portal.support_email),
    );

    Html(auth_layout("Sign in", &portal.company_name, &content)).into_response()
}

/// `POST /login`: verify credentials and start a session.
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.auth().sign_in(&form.email, &form.password).await {
        Ok(signed_in) => {
            let target = post_login_target(form.redirect.as_deref(), signed_in.role);
            let cookie = session_cookie(
                state.session_cookie(),
                &signed_in.session.token,
                state.auth().session_ttl().num_seconds(),
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response()
        }
        Err(e) => {
            let code = match e {
                AuthError::InvalidCredentials => "invalid",
                AuthError::UnknownRole => "role",
                other => {
                    tracing::error!(error = %other, "Sign-in failed");
                    "server"
                }
            };
            let redirect = urlencoding::encode(form.redirect.as_deref().unwrap_or(""));
            Redirect::to(&format!("/?error={code}&redirect={redirect}")).into_response()
        }
    }
}

/// `GET|POST /logout`: end the session and clear the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_session_cookie(&headers, state.session_cookie())
        && let Err(e) = state.auth().sign_out(&token).await
    {
        tracing::warn!(error = %e, "Failed to delete session");
    }
    (
        [(header::SET_COOKIE, clear_session_cookie(state.session_cookie()))],
        Redirect::to("/"),
    )
        .into_response()
}
