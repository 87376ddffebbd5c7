//! Route definitions for the portal.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, api};
use crate::state::AppState;
use crate::{assets, login, pages, pages_admin, pages_service, session, upload};

/// Create the portal router.
///
/// Each role's pages sit behind one guard layer; the login page, health
/// check, assets, downloads and JSON endpoints resolve sessions themselves.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.portal().max_upload_bytes;

    let client = Router::new()
        .route("/client", get(pages::client_dashboard))
        .route(
            "/client/upload-documents",
            get(pages::upload_page)
                .post(upload::upload_documents)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/client/my-documents", get(pages::my_documents))
        .route("/client/onboarding-status", get(pages::onboarding_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), session::require_client));

    let admin = Router::new()
        .route("/admin", get(pages_admin::admin_dashboard))
        .route("/admin/all-clients", get(pages_admin::all_clients))
        .route("/admin/clients/{id}", get(pages_admin::client_details))
        .route("/admin/clients/{id}/delete", post(pages_admin::delete_client))
        .route("/admin/document-review", get(pages_admin::document_review))
        .route(
            "/admin/documents/{id}/status",
            post(pages_admin::update_document_status),
        )
        .route("/admin/user-management", get(pages_admin::user_management))
        .route("/admin/users", post(pages_admin::create_user))
        .route("/admin/users/{id}/role", post(pages_admin::change_role))
        .route("/admin/settings", get(pages_admin::settings))
        .route_layer(middleware::from_fn_with_state(state.clone(), session::require_admin));

    let service_center = Router::new()
        .route("/service-center", get(pages_service::service_dashboard))
        .route(
            "/service-center/pending-clients",
            get(pages_service::pending_clients),
        )
        .route("/service-center/review-queue", get(pages_service::review_queue))
        .route("/service-center/completed", get(pages_service::completed))
        .route(
            "/service-center/clients/{id}/verify",
            post(pages_service::verify_client),
        )
        .route(
            "/service-center/documents/{id}/status",
            post(pages_service::update_document_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_service_center,
        ));

    Router::new()
        .route("/", get(login::login_page))
        .route("/login", post(login::login_submit))
        .route("/logout", get(login::logout).post(login::logout))
        .route("/healthz", get(handlers::healthz))
        .route("/assets/{*path}", get(assets::serve_asset))
        .route("/documents/{id}/file", get(upload::download_document))
        .route("/api/users/create", post(api::create_user))
        .route("/api/onboarding", get(api::onboarding))
        .merge(client)
        .merge(admin)
        .merge(service_center)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
