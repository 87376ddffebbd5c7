//! Admin pages and actions.

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use clienthub_auth::{AuthError, CreateUser};
use clienthub_core::model::{DocumentStatus, Role, format_file_size};
use clienthub_core::onboarding::{ClientFilter, ClientOverview, ClientStatus, display_percentage};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::PortalError;
use crate::login::local_target;
use crate::pages::{
    NoticeQuery, StatusForm, client_overview, client_overviews, download_link, or_empty, render,
    review_actions, set_document_status, steps_list, with_flash,
};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::templates::*;

const CLIENT_HEADERS: [&str; 7] = [
    "Client Name",
    "Email",
    "Progress",
    "Status",
    "Role",
    "Join Date",
    "Actions",
];

fn client_rows(overviews: &[ClientOverview], with_delete: bool) -> Vec<Vec<String>> {
    overviews
        .iter()
        .map(|o| {
            let view = link_button(&format!("/admin/clients/{}", o.client.id), "View");
            let actions = if with_delete {
                format!(
                    r#"<div class="flex items-center gap-3">{view}{}</div>"#,
                    action_button(
                        &format!("/admin/clients/{}/delete", o.client.id),
                        "Delete",
                        "danger",
                        &[],
                    )
                )
            } else {
                view
            };
            vec![
                format!(
                    r#"<span class="font-medium">{}</span>"#,
                    html_escape(&o.client.business_name)
                ),
                html_escape(o.owner_email()),
                format!(
                    r#"<div class="w-40">{}</div>"#,
                    progress_bar(display_percentage(o.percentage))
                ),
                client_status_badge(o.status),
                o.owner_role()
                    .map(|r| badge(r.label(), "gray"))
                    .unwrap_or_else(|| "-".to_string()),
                format_date(o.client.created_at),
                actions,
            ]
        })
        .collect()
}

fn clients_table(overviews: &[ClientOverview], with_delete: bool) -> String {
    if overviews.is_empty() {
        empty_state("users", "No clients found", "Clients appear here once they sign up.", None)
    } else {
        table(&CLIENT_HEADERS, &client_rows(overviews, with_delete))
    }
}

/// `GET /admin`
pub async fn admin_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let overviews = or_empty(client_overviews(&state).await, "client overviews");
    let documents = or_empty(state.repo().list_documents().await, "documents");

    let completed = overviews
        .iter()
        .filter(|o| o.status == ClientStatus::Completed)
        .count();
    let in_progress = overviews
        .iter()
        .filter(|o| matches!(o.status, ClientStatus::InProgress | ClientStatus::UnderReview))
        .count();
    let pending_documents = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Pending)
        .count();

    let stats = format!(
        r##"<div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-6 mb-8">
            {}{}{}{}
        </div>"##,
        stats_card("Total Clients", &overviews.len().to_string(), "users", "blue"),
        stats_card("Completed", &completed.to_string(), "check-circle", "green"),
        stats_card("In Progress", &in_progress.to_string(), "spinner", "purple"),
        stats_card("Pending Documents", &pending_documents.to_string(), "clock", "yellow"),
    );

    let recent: Vec<ClientOverview> = overviews.into_iter().take(5).collect();
    let content = format!(
        "{}{}{}{}",
        page_header(
            "Admin Dashboard",
            "Manage clients, review documents, and oversee the onboarding process."
        ),
        query.banner(),
        stats,
        card(
            "Recent Clients",
            &format!(
                r#"{}<div class="mt-4">{}</div>"#,
                clients_table(&recent, false),
                link_button("/admin/all-clients", "View all clients")
            )
        ),
    );
    render(&state, &current, "Dashboard", "/admin", &content)
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientsQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

fn status_options(selected: Option<&str>) -> Vec<(String, String, bool)> {
    let selected = selected.unwrap_or("all");
    let mut options = vec![("all".to_string(), "All Statuses".to_string(), selected == "all")];
    for status in [
        ClientStatus::Completed,
        ClientStatus::InProgress,
        ClientStatus::UnderReview,
        ClientStatus::Pending,
        ClientStatus::Rejected,
    ] {
        options.push((
            status.slug().to_string(),
            status.label().to_string(),
            selected == status.slug(),
        ));
    }
    options
}

fn role_options(selected: Option<&str>, include_all: bool) -> Vec<(String, String, bool)> {
    let selected = selected.unwrap_or("all");
    let mut options = Vec::new();
    if include_all {
        options.push(("all".to_string(), "All Roles".to_string(), selected == "all"));
    }
    for role in Role::ALL {
        options.push((
            role.as_str().to_string(),
            role.label().to_string(),
            Role::normalize(selected) == Some(role),
        ));
    }
    options
}

/// `GET /admin/all-clients`
pub async fn all_clients(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ClientsQuery>,
) -> Html<String> {
    let filter = ClientFilter::from_query(
        query.search.as_deref(),
        query.status.as_deref(),
        query.role.as_deref(),
    );
    let overviews = or_empty(client_overviews(&state).await, "client overviews");
    let total = overviews.len();
    let matching = filter.apply(overviews);

    let filters = format!(
        r##"<form method="get" action="/admin/all-clients" class="grid grid-cols-1 md:grid-cols-4 gap-4 mb-6 items-end">
            {search}
            {status}
            {role}
            <button type="submit" class="bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">
                <i class="fas fa-filter"></i> Filter
            </button>
        </form>"##,
        search = input(
            "search",
            "Search",
            "search",
            query.search.as_deref().unwrap_or(""),
            "Name or email",
        ),
        status = select("status", "Status", &status_options(query.status.as_deref())),
        role = select("role", "Role", &role_options(query.role.as_deref(), true)),
    );

    let content = format!(
        "{}{}{}",
        page_header("All Clients", "Search, filter and manage every client account"),
        NoticeQuery {
            notice: query.notice.clone(),
            error: query.error.clone(),
        }
        .banner(),
        card(
            &format!("Clients ({} of {total})", matching.len()),
            &format!("{filters}{}", clients_table(&matching, true)),
        ),
    );
    render(&state, &current, "All Clients", "/admin/all-clients", &content)
}

/// `GET /admin/clients/{id}`
pub async fn client_details(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PortalError> {
    let overview = client_overview(&state, id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("client {id}")))?;
    let here = format!("/admin/clients/{id}");

    let rows: Vec<Vec<String>> = overview
        .documents
        .iter()
        .map(|d| {
            vec![
                html_escape(&d.file_name),
                html_escape(&d.document_type),
                format_date(d.uploaded_at),
                format_file_size(d.file_size),
                document_status_badge(&d.status),
                format!(
                    r#"<div class="flex items-center gap-3">{}{}</div>"#,
                    download_link(d),
                    review_actions(&format!("/admin/documents/{}/status", d.id), &here)
                ),
            ]
        })
        .collect();
    let documents = if rows.is_empty() {
        empty_state("folder-open", "No documents", "This client has not uploaded anything yet.", None)
    } else {
        table(
            &["Filename", "Type", "Upload Date", "Size", "Status", "Actions"],
            &rows,
        )
    };

    let summary = format!(
        r##"<dl class="grid grid-cols-1 md:grid-cols-4 gap-4 mb-4 text-sm">
            <div><dt class="text-gray-500">Email</dt><dd class="font-medium">{email}</dd></div>
            <div><dt class="text-gray-500">Status</dt><dd>{status}</dd></div>
            <div><dt class="text-gray-500">Joined</dt><dd class="font-medium">{joined}</dd></div>
            <div><dt class="text-gray-500">Last Activity</dt><dd class="font-medium">{activity}</dd></div>
        </dl>
        {bar}"##,
        email = html_escape(overview.owner_email()),
        status = client_status_badge(overview.status),
        joined = format_date(overview.client.created_at),
        activity = format_optional_date(overview.last_activity()),
        bar = progress_bar(display_percentage(overview.percentage)),
    );

    let content = format!(
        r#"{}{}<div class="space-y-6">{}{}{}</div>"#,
        page_header(&overview.client.business_name, "Client details and submitted documents"),
        query.banner(),
        card("Overview", &summary),
        card("Onboarding Steps", &steps_list(&overview.steps, false)),
        card(&format!("Documents ({})", overview.documents.len()), &documents),
    );
    Ok(render(&state, &current, "Client Details", "/admin/all-clients", &content))
}

/// `POST /admin/clients/{id}/delete`
///
/// Removes the client and its document rows, then deletes their files.
pub async fn delete_client(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, PortalError> {
    let removed = state.repo().delete_client(id).await?;
    for document in &removed {
        if let Err(e) = state.blobs().delete(&document.file_url).await {
            tracing::warn!(error = %e, key = %document.file_url, "Failed to delete document file");
        }
    }
    tracing::info!(client_id = %id, documents = removed.len(), admin = %current.user.id, "Deleted client");
    Ok(Redirect::to(&with_flash("/admin/all-clients", "notice", "Client deleted")))
}

/// `GET /admin/document-review`
pub async fn document_review(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let documents = or_empty(state.repo().list_documents().await, "documents");
    let clients: HashMap<Uuid, String> = or_empty(state.repo().list_clients().await, "clients")
        .into_iter()
        .map(|c| (c.id, c.business_name))
        .collect();

    let pending = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::Pending)
        .count();
    let under_review = documents
        .iter()
        .filter(|d| d.status == DocumentStatus::UnderReview)
        .count();

    let here = "/admin/document-review";
    let rows: Vec<Vec<String>> = documents
        .iter()
        .filter(|d| matches!(d.status, DocumentStatus::Pending | DocumentStatus::UnderReview))
        .map(|d| {
            let client = d
                .client_id
                .and_then(|id| clients.get(&id))
                .map(|name| html_escape(name))
                .unwrap_or_else(|| "-".to_string());
            vec![
                html_escape(&d.file_name),
                client,
                html_escape(&d.document_type),
                format_date(d.uploaded_at),
                document_status_badge(&d.status),
                format!(
                    r#"<div class="flex items-center gap-3">{}{}</div>"#,
                    download_link(d),
                    review_actions(&format!("/admin/documents/{}/status", d.id), here)
                ),
            ]
        })
        .collect();

    let stats = format!(
        r##"<div class="grid grid-cols-1 md:grid-cols-3 gap-6 mb-8">{}{}{}</div>"##,
        stats_card("Pending Review", &pending.to_string(), "clock", "yellow"),
        stats_card("Under Review", &under_review.to_string(), "search", "blue"),
        stats_card("Total Files", &documents.len().to_string(), "file-alt", "purple"),
    );
    let queue = if rows.is_empty() {
        empty_state("check-double", "All caught up", "There are no documents waiting for review.", None)
    } else {
        table(
            &["Filename", "Client", "Type", "Upload Date", "Status", "Actions"],
            &rows,
        )
    };

    let content = format!(
        "{}{}{}{}",
        page_header("Document Review", "Review and approve submitted client documents"),
        query.banner(),
        stats,
        card("Documents Awaiting Review", &queue),
    );
    render(&state, &current, "Document Review", here, &content)
}

/// `POST /admin/documents/{id}/status`
pub async fn update_document_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, PortalError> {
    let document = set_document_status(&state, &current, id, &form.status).await?;
    let target = local_target(form.redirect.as_deref(), "/admin", "/admin/document-review");
    Ok(Redirect::to(&with_flash(
        &target,
        "notice",
        &format!("{} marked {}", document.file_name, document.status.label()),
    )))
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub search: Option<String>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// `GET /admin/user-management`
pub async fn user_management(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<UsersQuery>,
) -> Html<String> {
    let users = or_empty(state.repo().list_users().await, "users");
    let count = |role: Role| users.iter().filter(|u| u.role() == Some(role)).count();
    let stats = format!(
        r##"<div class="grid grid-cols-1 md:grid-cols-4 gap-6 mb-8">{}{}{}{}</div>"##,
        stats_card("Total Users", &users.len().to_string(), "users", "blue"),
        stats_card("Clients", &count(Role::Client).to_string(), "user", "green"),
        stats_card("Admins", &count(Role::Admin).to_string(), "user-shield", "purple"),
        stats_card("Service Center", &count(Role::ServiceCenter).to_string(), "headset", "yellow"),
    );

    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let rows: Vec<Vec<String>> = users
        .iter()
        .filter(|u| {
            needle.as_ref().is_none_or(|n| {
                u.email.to_lowercase().contains(n.as_str())
                    || u.full_name.to_lowercase().contains(n.as_str())
            })
        })
        .map(|u| {
            let role_badge = match u.role() {
                Some(role) => badge(role.label(), "blue"),
                None => badge(&u.role, "red"),
            };
            let change_role = format!(
                r##"<form method="post" action="/admin/users/{id}/role" class="flex items-center gap-2">
                    {select}
                    <button type="submit" class="bg-primary-600 hover:bg-primary-700 text-white px-3 py-1 rounded-lg text-xs font-medium">Update</button>
                </form>"##,
                id = u.id,
                select = select("role", "", &role_options(Some(u.role.as_str()), false)),
            );
            vec![
                html_escape(u.display_name()),
                html_escape(&u.email),
                role_badge,
                format_date(u.created_at),
                change_role,
            ]
        })
        .collect();

    let create_form = format!(
        r##"<form method="post" action="/admin/users" class="grid grid-cols-1 md:grid-cols-5 gap-4 items-end">
            {}{}{}{}
            <button type="submit" class="bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">
                <i class="fas fa-user-plus"></i> Create User
            </button>
        </form>"##,
        input("full_name", "Full Name", "text", "", "Jane Doe"),
        input("email", "Email", "email", "", "jane@example.com"),
        input("password", "Password", "password", "", "At least 6 characters"),
        select("role", "Role", &role_options(Some("client"), false)),
    );

    let search = format!(
        r##"<form method="get" action="/admin/user-management" class="flex gap-2 mb-4">
            <input type="search" name="search" value="{}" placeholder="Search by name or email"
                   class="flex-1 px-4 py-2 border border-gray-300 rounded-lg">
            <button type="submit" class="bg-gray-200 hover:bg-gray-300 text-gray-700 px-4 py-2 rounded-lg font-medium">Search</button>
        </form>"##,
        html_escape(query.search.as_deref().unwrap_or("")),
    );
    let list = if rows.is_empty() {
        empty_state("user-slash", "No users found", "Try a different search.", None)
    } else {
        table(&["Name", "Email", "Role", "Joined", "Change Role"], &rows)
    };

    let content = format!(
        r#"{}{}{}<div class="space-y-6">{}{}</div>"#,
        page_header("User Management", "Create accounts and manage user roles"),
        notice_banner(query.notice.as_deref(), query.error.as_deref()),
        stats,
        card("Create User", &create_form),
        card("Users", &format!("{search}{list}")),
    );
    render(&state, &current, "User Management", "/admin/user-management", &content)
}

#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub role: String,
}

/// `POST /admin/users`
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<CreateUserForm>,
) -> Result<Redirect, PortalError> {
    let result = state
        .auth()
        .create_user(CreateUser {
            email: form.email,
            password: form.password,
            full_name: form.full_name,
            role: form.role,
        })
        .await;
    let target = match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, admin = %current.user.id, "Admin created user");
            with_flash("/admin/user-management", "notice", "User created successfully")
        }
        Err(AuthError::InvalidInput(message)) => {
            with_flash("/admin/user-management", "error", &message)
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Redirect::to(&target))
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// `POST /admin/users/{id}/role`
pub async fn change_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<RoleForm>,
) -> Result<Response, PortalError> {
    let Some(role) = Role::normalize(&form.role) else {
        return Ok(Redirect::to(&with_flash(
            "/admin/user-management",
            "error",
            &format!("Unknown role: {}", form.role),
        ))
        .into_response());
    };
    let user = state.repo().update_user_role(id, role).await?;
    if role == Role::Client && state.repo().find_client_by_owner(user.id).await?.is_none() {
        state
            .repo()
            .create_client(user.display_name(), Some(user.id))
            .await?;
    }
    tracing::info!(user_id = %user.id, role = %role, admin = %current.user.id, "Changed user role");
    Ok(Redirect::to(&with_flash(
        "/admin/user-management",
        "notice",
        &format!("{} is now {}", user.display_name(), role.label()),
    ))
    .into_response())
}

/// `GET /admin/settings`
pub async fn settings(State(state): State<AppState>, current: CurrentUser) -> Html<String> {
    let config = state.config();
    let portal = &config.portal;
    let row = |label: &str, value: &str| {
        format!(
            r##"<div class="py-3 flex justify-between border-b border-gray-100">
                <dt class="text-sm text-gray-500">{label}</dt>
                <dd class="text-sm font-medium text-gray-900">{}</dd>
            </div>"##,
            html_escape(value)
        )
    };

    let company = [
        row("Company Name", &portal.company_name),
        row("Support Email", &portal.support_email),
        row("Description", &portal.company_description),
        row("Timezone", &portal.timezone),
    ]
    .concat();
    let uploads = [
        row("Accepted File Types", &portal.accepted_file_types.join(", ")),
        row("Max Upload Size", &format!("{} MB", portal.max_upload_megabytes())),
        row("Document Types", &portal.document_types.join(", ")),
        row("Storage Backend", &format!("{:?}", config.storage.backend)),
    ]
    .concat();
    let security = [
        row("Session Cookie", &config.auth.session_cookie),
        row("Session Lifetime", &format!("{} hours", config.auth.session_ttl_hours)),
    ]
    .concat();

    let content = format!(
        r#"{}<div class="grid grid-cols-1 lg:grid-cols-2 gap-6">{}{}{}</div>"#,
        page_header("System Settings", "Configure system preferences and settings"),
        card("Company", &format!("<dl>{company}</dl>")),
        card("Uploads", &format!("<dl>{uploads}</dl>")),
        card("Security", &format!("<dl>{security}</dl>")),
    );
    render(&state, &current, "Settings", "/admin/settings", &content)
}
