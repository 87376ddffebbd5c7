//! Service-center pages and review actions.

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use clienthub_core::model::DocumentStatus;
use clienthub_core::onboarding::{ClientOverview, ClientStatus};
use uuid::Uuid;

use crate::error::PortalError;
use crate::login::local_target;
use crate::pages::{
    NoticeQuery, StatusForm, client_overviews, download_link, or_empty, render, review_actions,
    set_document_status, with_flash,
};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::templates::*;

const QUEUE_HEADERS: [&str; 5] = ["Client Name", "Submission Date", "Status", "Documents", "Actions"];

fn submission_date(overview: &ClientOverview) -> String {
    format_date(overview.last_activity().unwrap_or(overview.client.created_at))
}

fn by_status(overviews: &[ClientOverview], statuses: &[ClientStatus]) -> Vec<ClientOverview> {
    overviews
        .iter()
        .filter(|o| statuses.contains(&o.status))
        .cloned()
        .collect()
}

fn name_cell(overview: &ClientOverview) -> String {
    format!(
        r#"<div class="font-medium">{}</div><div class="text-xs text-gray-500">{}</div>"#,
        html_escape(&overview.client.business_name),
        html_escape(overview.owner_email()),
    )
}

fn verify_button(overview: &ClientOverview) -> String {
    action_button(
        &format!("/service-center/clients/{}/verify", overview.client.id),
        "Verify",
        "primary",
        &[],
    )
}

fn pending_table(overviews: &[ClientOverview]) -> String {
    if overviews.is_empty() {
        return empty_state("inbox", "No pending clients", "New submissions will appear here.", None);
    }
    let rows: Vec<Vec<String>> = overviews
        .iter()
        .map(|o| {
            vec![
                name_cell(o),
                submission_date(o),
                client_status_badge(o.status),
                o.documents.len().to_string(),
                verify_button(o),
            ]
        })
        .collect();
    table(&QUEUE_HEADERS, &rows)
}

fn review_table(overviews: &[ClientOverview]) -> String {
    if overviews.is_empty() {
        return empty_state("shield-alt", "Review queue is empty", "Verified clients awaiting a decision appear here.", None);
    }
    let rows: Vec<Vec<String>> = overviews
        .iter()
        .map(|o| {
            vec![
                name_cell(o),
                submission_date(o),
                client_status_badge(o.status),
                format!(
                    "{} under review",
                    o.count_with_status(&DocumentStatus::UnderReview)
                ),
                link_button("/service-center/review-queue", "Review"),
            ]
        })
        .collect();
    table(&QUEUE_HEADERS, &rows)
}

fn completed_table(overviews: &[ClientOverview]) -> String {
    if overviews.is_empty() {
        return empty_state("check-circle", "No completed reviews", "Finished reviews will appear here.", None);
    }
    let rows: Vec<Vec<String>> = overviews
        .iter()
        .map(|o| {
            vec![
                name_cell(o),
                submission_date(o),
                client_status_badge(o.status),
                format!(
                    r#"<span class="text-green-700">{} approved</span> / <span class="text-red-700">{} rejected</span>"#,
                    o.count_with_status(&DocumentStatus::Approved),
                    o.count_with_status(&DocumentStatus::Rejected),
                ),
                format_optional_date(o.last_activity()),
            ]
        })
        .collect();
    table(
        &["Client Name", "Submission Date", "Status", "Documents", "Last Activity"],
        &rows,
    )
}

/// `GET /service-center`
pub async fn service_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let overviews = or_empty(client_overviews(&state).await, "client overviews");
    let pending = by_status(&overviews, &[ClientStatus::Pending]);
    let reviewing = by_status(&overviews, &[ClientStatus::UnderReview]);
    let completed = by_status(&overviews, &[ClientStatus::Completed, ClientStatus::Rejected]);

    let stats = format!(
        r##"<div class="grid grid-cols-1 md:grid-cols-3 gap-6 mb-8">{}{}{}</div>"##,
        stats_card("Pending Review", &pending.len().to_string(), "clock", "yellow"),
        stats_card("Under Review", &reviewing.len().to_string(), "search", "blue"),
        stats_card("Completed", &completed.len().to_string(), "check-circle", "green"),
    );
    let content = format!(
        "{}{}{}{}",
        page_header(
            "Service Center Dashboard",
            "Review and verify client documents and onboarding submissions."
        ),
        query.banner(),
        stats,
        card(
            "Submissions",
            &tabs(
                "service-tabs",
                &[
                    ("pending", "Pending Clients", pending_table(&pending)),
                    ("review", "Review Queue", review_table(&reviewing)),
                    ("completed", "Completed Reviews", completed_table(&completed)),
                ],
            ),
        ),
    );
    render(&state, &current, "Dashboard", "/service-center", &content)
}

/// `GET /service-center/pending-clients`
pub async fn pending_clients(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let overviews = or_empty(client_overviews(&state).await, "client overviews");
    let pending = by_status(&overviews, &[ClientStatus::Pending]);
    let content = format!(
        "{}{}{}",
        page_header("Pending Clients", "Clients whose submissions have not been verified yet"),
        query.banner(),
        card(&format!("Pending ({})", pending.len()), &pending_table(&pending)),
    );
    render(&state, &current, "Pending Clients", "/service-center/pending-clients", &content)
}

/// `GET /service-center/review-queue`
pub async fn review_queue(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let here = "/service-center/review-queue";
    let overviews = or_empty(client_overviews(&state).await, "client overviews");
    let reviewing = by_status(&overviews, &[ClientStatus::UnderReview]);

    let cards: String = if reviewing.is_empty() {
        card("Review Queue", &review_table(&reviewing))
    } else {
        reviewing
            .iter()
            .map(|o| {
                let rows: Vec<Vec<String>> = o
                    .documents
                    .iter()
                    .map(|d| {
                        let actions = if d.status.is_done() {
                            download_link(d)
                        } else {
                            format!(
                                r#"<div class="flex items-center gap-3">{}{}</div>"#,
                                download_link(d),
                                review_actions(&format!("/service-center/documents/{}/status", d.id), here)
                            )
                        };
                        vec![
                            html_escape(&d.file_name),
                            html_escape(&d.document_type),
                            format_date(d.uploaded_at),
                            document_status_badge(&d.status),
                            actions,
                        ]
                    })
                    .collect();
                format!(
                    r#"<div class="mb-6">{}</div>"#,
                    card(
                        &html_escape(&o.client.business_name),
                        &table(&["Filename", "Type", "Upload Date", "Status", "Actions"], &rows),
                    )
                )
            })
            .collect()
    };

    let content = format!(
        "{}{}{}",
        page_header("Review Queue", "Approve or reject documents under review"),
        query.banner(),
        cards,
    );
    render(&state, &current, "Review Queue", here, &content)
}

/// `GET /service-center/completed`
pub async fn completed(State(state): State<AppState>, current: CurrentUser) -> Html<String> {
    let overviews = or_empty(client_overviews(&state).await, "client overviews");
    let done = by_status(&overviews, &[ClientStatus::Completed, ClientStatus::Rejected]);
    let content = format!(
        "{}{}",
        page_header("Completed Reviews", "Clients whose review has finished"),
        card(&format!("Completed ({})", done.len()), &completed_table(&done)),
    );
    render(&state, &current, "Completed", "/service-center/completed", &content)
}

/// `POST /service-center/clients/{id}/verify`
///
/// Moves the client's pending documents to under review.
pub async fn verify_client(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, PortalError> {
    let repo = state.repo();
    let client = repo
        .get_client(id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("client {id}")))?;

    let mut moved = 0;
    for document in repo.list_documents_by_client(id).await? {
        if document.status == DocumentStatus::Pending {
            repo.update_document_status(document.id, DocumentStatus::UnderReview, Some(current.user.id))
                .await?;
            moved += 1;
        }
    }
    tracing::info!(client_id = %id, documents = moved, reviewer = %current.user.id, "Client verified");

    Ok(Redirect::to(&with_flash(
        "/service-center/pending-clients",
        "notice",
        &format!("{}: {moved} document(s) moved to review", client.business_name),
    )))
}

/// `POST /service-center/documents/{id}/status`
pub async fn update_document_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, PortalError> {
    let document = set_document_status(&state, &current, id, &form.status).await?;
    let target = local_target(
        form.redirect.as_deref(),
        "/service-center",
        "/service-center/review-queue",
    );
    Ok(Redirect::to(&with_flash(
        &target,
        "notice",
        &format!("{} marked {}", document.file_name, document.status.label()),
    )))
}
