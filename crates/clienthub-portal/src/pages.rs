//! Client pages and fragments shared by every role's pages.

use axum::{
    extract::{Query, State},
    response::Html,
};
use clienthub_core::model::{Client, Document, DocumentStatus, User, format_file_size};
use clienthub_core::onboarding::{
    ClientOverview, ClientStatus, StepProgress, current_step, derive_steps, display_percentage,
    progress_percentage,
};
use clienthub_store::StoreError;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::PortalError;
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::templates::*;

/// Flash messages carried across a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl NoticeQuery {
    pub fn banner(&self) -> String {
        notice_banner(self.notice.as_deref(), self.error.as_deref())
    }
}

/// Wrap page content in the signed-in layout.
pub fn render(state: &AppState, current: &CurrentUser, title: &str, path: &str, content: &str) -> Html<String> {
    Html(layout(title, path, current, &state.portal().company_name, content))
}

/// Unwrap a read for display, logging the failure and falling back to an
/// empty value.
pub fn or_empty<T: Default>(result: Result<T, StoreError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, what, "Failed to load page data");
        T::default()
    })
}

/// Append a flash message to a redirect target.
pub fn with_flash(path: &str, key: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(message))
}

/// Every client with its owner and documents, newest client first.
pub async fn client_overviews(state: &AppState) -> Result<Vec<ClientOverview>, StoreError> {
    let repo = state.repo();
    let clients = repo.list_clients().await?;
    let users: HashMap<Uuid, User> = repo
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let mut documents: HashMap<Uuid, Vec<Document>> = HashMap::new();
    for document in repo.list_documents().await? {
        if let Some(client_id) = document.client_id {
            documents.entry(client_id).or_default().push(document);
        }
    }
    Ok(clients
        .into_iter()
        .map(|client| {
            let owner = client.created_by.and_then(|id| users.get(&id).cloned());
            let docs = documents.remove(&client.id).unwrap_or_default();
            ClientOverview::build(client, owner, docs)
        })
        .collect())
}

/// One client's overview.
pub async fn client_overview(state: &AppState, id: Uuid) -> Result<Option<ClientOverview>, StoreError> {
    let repo = state.repo();
    let Some(client) = repo.get_client(id).await? else {
        return Ok(None);
    };
    Ok(Some(overview_for(state, client).await?))
}

async fn overview_for(state: &AppState, client: Client) -> Result<ClientOverview, StoreError> {
    let repo = state.repo();
    let owner = match client.created_by {
        Some(user_id) => repo.get_user(user_id).await?,
        None => None,
    };
    let documents = repo.list_documents_by_client(client.id).await?;
    Ok(ClientOverview::build(client, owner, documents))
}

/// Status change posted from a review table.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Write a document status on behalf of a reviewer. Any status is accepted.
pub async fn set_document_status(
    state: &AppState,
    reviewer: &CurrentUser,
    id: Uuid,
    status: &str,
) -> Result<Document, PortalError> {
    let status = status.trim();
    if status.is_empty() {
        return Err(PortalError::InvalidRequest("Status is required".to_string()));
    }
    let document = state
        .repo()
        .update_document_status(id, DocumentStatus::parse(status), Some(reviewer.user.id))
        .await?;
    tracing::info!(
        document_id = %document.id,
        status = %document.status,
        reviewer = %reviewer.user.id,
        "Document status updated"
    );
    Ok(document)
}

/// Approve and reject buttons for one document.
pub fn review_actions(action: &str, redirect: &str) -> String {
    format!(
        r#"<div class="flex gap-2">{}{}</div>"#,
        action_button(action, "Approve", "success", &[("status", "approved"), ("redirect", redirect)]),
        action_button(action, "Reject", "danger", &[("status", "rejected"), ("redirect", redirect)]),
    )
}

/// The four onboarding steps as a vertical checklist. With `actions`, each
/// step links to the upload form preset to its document type.
pub fn steps_list(steps: &[StepProgress], actions: bool) -> String {
    let current = current_step(steps).map(|s| s.step);
    steps
        .iter()
        .enumerate()
        .map(|(i, progress)| {
            let (icon, ring) = if progress.is_done() {
                ("check", "bg-green-100 text-green-600")
            } else if Some(progress.step) == current {
                ("hourglass-half", "bg-blue-100 text-blue-600")
            } else {
                ("circle", "bg-gray-100 text-gray-400")
            };
            let action = if actions {
                link_button(
                    &format!(
                        "/client/upload-documents?document_type={}",
                        urlencoding::encode(default_document_type(progress))
                    ),
                    progress.action_label(),
                )
            } else {
                String::new()
            };
            format!(
                r##"<div class="flex items-start gap-4 py-4 {border}">
                    <div class="w-10 h-10 rounded-full {ring} flex items-center justify-center shrink-0">
                        <i class="fas fa-{icon}"></i>
                    </div>
                    <div class="flex-1 min-w-0">
                        <div class="flex items-center gap-2">
                            <h4 class="font-medium text-gray-900">{title}</h4>
                            {badge}
                        </div>
                        <p class="text-sm text-gray-500">{description}</p>
                        <p class="text-xs text-gray-400 mt-1">Last updated: {updated}</p>
                    </div>
                    {action}
                </div>"##,
                border = if i > 0 { "border-t border-gray-100" } else { "" },
                title = progress.step.title(),
                badge = document_status_badge(&progress.status),
                description = progress.step.description(),
                updated = format_optional_date(progress.last_updated),
            )
        })
        .collect()
}

fn default_document_type(progress: &StepProgress) -> &'static str {
    use clienthub_core::onboarding::OnboardingStep;
    match progress.step {
        OnboardingStep::Profile => "Profile Verification",
        OnboardingStep::Kyc => "KYC Documents",
        OnboardingStep::Insurance => "Insurance Documents",
        OnboardingStep::Final => "Final Approval",
    }
}

/// Link that downloads a stored document.
pub fn download_link(document: &Document) -> String {
    link_button(
        &format!("/documents/{}/file", document.id),
        r#"<i class="fas fa-download"></i> Download"#,
    )
}

/// Rows describing documents: name, type, date, size, status, download.
pub fn document_rows(documents: &[Document]) -> Vec<Vec<String>> {
    documents
        .iter()
        .map(|d| {
            vec![
                format!(
                    r#"<i class="fas fa-file-alt text-gray-400 mr-2"></i>{}"#,
                    html_escape(&d.file_name)
                ),
                html_escape(&d.document_type),
                format_date(d.uploaded_at),
                format_file_size(d.file_size),
                document_status_badge(&d.status),
                download_link(d),
            ]
        })
        .collect()
}

pub const DOCUMENT_HEADERS: [&str; 6] = ["Filename", "Type", "Upload Date", "Size", "Status", "Actions"];

fn upload_cta() -> Option<(&'static str, &'static str)> {
    Some(("Upload Documents", "/client/upload-documents"))
}

/// `GET /client`
pub async fn client_dashboard(State(state): State<AppState>, current: CurrentUser) -> Html<String> {
    let documents = or_empty(
        state.repo().list_documents_by_uploader(current.user.id).await,
        "client documents",
    );
    let steps = derive_steps(&documents);
    let percent = display_percentage(progress_percentage(&steps));
    let status = ClientStatus::derive(&documents, &steps);
    let step_label = current_step(&steps)
        .map(|s| s.step.title())
        .unwrap_or("Complete");

    let stats = format!(
        r##"<div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-6 mb-8">
            <a href="/client/upload-documents" class="block">{upload}</a>
            {progress}
            {count}
            {status}
        </div>"##,
        upload = stats_card("Upload Documents", "Upload", "upload", "blue"),
        progress = stats_card("Onboarding Progress", &format!("{percent}%"), "chart-line", "green"),
        count = stats_card("Documents", &documents.len().to_string(), "file-alt", "purple"),
        status = stats_card("Status", status.label(), "info-circle", client_status_color(status)),
    );

    let recent: Vec<Document> = documents.iter().take(5).cloned().collect();
    let documents_tab = if recent.is_empty() {
        empty_state(
            "folder-open",
            "No documents yet",
            "Upload your first document to start onboarding.",
            upload_cta(),
        )
    } else {
        table(&DOCUMENT_HEADERS, &document_rows(&recent))
    };
    let status_tab = format!(
        r##"<div class="mb-4">{bar}</div>
        <p class="text-sm text-gray-500 mb-2">Current step: <span class="font-medium text-gray-900">{step_label}</span></p>
        {steps}"##,
        bar = progress_bar(percent),
        steps = steps_list(&steps, true),
    );
    let upload_tab = format!(
        r##"<p class="text-gray-600 mb-4">Upload required documents for your onboarding process.</p>
        {link}"##,
        link = link_button("/client/upload-documents", r#"<i class="fas fa-upload"></i> Go to upload"#),
    );

    let content = format!(
        r##"<div class="mb-8">
            <h1 class="text-2xl font-bold text-gray-900">Welcome back, {name}!</h1>
            <p class="text-gray-500 mt-1">{email}</p>
        </div>
        {stats}
        {tabs}"##,
        name = html_escape(current.user.display_name()),
        email = html_escape(&current.user.email),
        tabs = card(
            "Overview",
            &tabs(
                "client-tabs",
                &[
                    ("status", "Onboarding Status", status_tab),
                    ("documents", "My Documents", documents_tab),
                    ("upload", "Upload Documents", upload_tab),
                ],
            ),
        ),
    );

    render(&state, &current, "Dashboard", "/client", &content)
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadPageQuery {
    pub document_type: Option<String>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// `GET /client/upload-documents`
pub async fn upload_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<UploadPageQuery>,
) -> Html<String> {
    let portal = state.portal();
    let preselected = query.document_type.as_deref();
    let options: Vec<(String, String, bool)> = portal
        .document_types
        .iter()
        .map(|t| (t.clone(), t.clone(), Some(t.as_str()) == preselected))
        .collect();
    let formats = portal
        .accepted_file_types
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");

    let form = format!(
        r##"<form method="post" action="/client/upload-documents" enctype="multipart/form-data" class="space-y-6">
            {select}
            <div class="border-2 border-dashed border-gray-300 rounded-xl p-8 text-center">
                <i class="fas fa-cloud-upload-alt text-4xl text-gray-400 mb-3"></i>
                <p class="font-medium text-gray-900">Upload your documents</p>
                <p class="text-sm text-gray-500 mb-4">Select one or more files</p>
                <label class="inline-flex items-center gap-2 bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium cursor-pointer">
                    <i class="fas fa-folder-open"></i> Choose Files
                    <input type="file" name="files" multiple accept="{accept}" class="hidden">
                </label>
            </div>
            <button type="submit" class="w-full bg-primary-600 hover:bg-primary-700 text-white px-4 py-2 rounded-lg font-medium transition-colors">
                Upload
            </button>
        </form>"##,
        select = select("document_type", "Document Type", &options),
        accept = html_escape(&portal.accept_attribute()),
    );

    let content = format!(
        r##"{header}
        {banner}
        {card}"##,
        header = page_header("Upload Documents", "Upload required documents for your onboarding process"),
        banner = notice_banner(query.notice.as_deref(), query.error.as_deref()),
        card = card(
            "Document Upload",
            &format!(
                r##"<p class="text-sm text-gray-500 mb-6">Supported formats: {formats} (Max {max}MB per file)</p>{form}"##,
                max = portal.max_upload_megabytes(),
            ),
        ),
    );

    render(&state, &current, "Upload Documents", "/client/upload-documents", &content)
}

/// `GET /client/my-documents`
pub async fn my_documents(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<NoticeQuery>,
) -> Html<String> {
    let documents = or_empty(
        state.repo().list_documents_by_uploader(current.user.id).await,
        "client documents",
    );
    let body = if documents.is_empty() {
        empty_state(
            "folder-open",
            "No documents uploaded",
            "Documents you upload will appear here.",
            upload_cta(),
        )
    } else {
        table(&DOCUMENT_HEADERS, &document_rows(&documents))
    };
    let content = format!(
        "{}{}{}",
        page_header("My Documents", "All documents you have submitted"),
        query.banner(),
        card(&format!("Documents ({})", documents.len()), &body),
    );
    render(&state, &current, "My Documents", "/client/my-documents", &content)
}

/// `GET /client/onboarding-status`
pub async fn onboarding_status(State(state): State<AppState>, current: CurrentUser) -> Html<String> {
    let documents = or_empty(
        state.repo().list_documents_by_uploader(current.user.id).await,
        "client documents",
    );
    let steps = derive_steps(&documents);
    let done = steps.iter().filter(|s| s.is_done()).count();
    let percent = display_percentage(progress_percentage(&steps));

    let overall = format!(
        r##"{bar}
        <p class="text-sm text-gray-500 mt-2">{done} of {total} steps completed</p>"##,
        bar = progress_bar(percent),
        total = steps.len(),
    );
    let content = format!(
        r#"{}{}<div class="mt-6">{}</div>"#,
        page_header("Onboarding Status", "Track your progress through the onboarding process"),
        card("Overall Progress", &overall),
        card("Onboarding Steps", &steps_list(&steps, true)),
    );
    render(&state, &current, "Onboarding Status", "/client/onboarding-status", &content)
}
