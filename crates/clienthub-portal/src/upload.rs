//! Document upload and download.

use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use clienthub_core::model::{Document, NewDocument, Role, User};
use clienthub_store::blob::sanitize_file_name;
use clienthub_store::object_key;
use uuid::Uuid;

use crate::error::PortalError;
use crate::pages::with_flash;
use crate::session::CurrentUser;
use crate::state::AppState;

const UPLOAD_PAGE: &str = "/client/upload-documents";

/// One file taken from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Parsed upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub document_type: String,
    pub files: Vec<UploadedFile>,
}

fn multipart_error(e: MultipartError, limit_mb: usize) -> PortalError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PortalError::InvalidRequest(format!("File exceeds the {limit_mb} MB limit"))
    } else {
        PortalError::InvalidRequest(format!("Invalid upload: {e}"))
    }
}

async fn read_form(mut multipart: Multipart, limit_mb: usize) -> Result<UploadForm, PortalError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document_type" => {
                form.document_type = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, limit_mb))?
                    .trim()
                    .to_string();
            }
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, limit_mb))?;
                // browsers send an empty part when no file was chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.push(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!(field = other, "Ignoring upload field"),
        }
    }
    Ok(form)
}

/// Write one file to the blob store and record its metadata.
///
/// When the metadata insert fails, the already written blob is deleted.
pub async fn store_file(
    state: &AppState,
    uploader: &User,
    client_id: Uuid,
    document_type: &str,
    file: UploadedFile,
) -> Result<Document, PortalError> {
    let file_name = sanitize_file_name(&file.file_name);
    let key = object_key(
        document_type,
        uploader.id,
        Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        &file_name,
    );
    let content_type = file.content_type.filter(|ct| !ct.is_empty()).or_else(|| {
        mime_guess::from_path(&file_name)
            .first_raw()
            .map(str::to_string)
    });
    let file_size = file.bytes.len() as i64;

    state.blobs().put(&key, file.bytes).await?;

    let inserted = state
        .repo()
        .insert_document(NewDocument {
            client_id: Some(client_id),
            uploaded_by: uploader.id,
            file_name,
            file_url: key.clone(),
            document_type: document_type.to_string(),
            file_size,
            content_type,
        })
        .await;

    match inserted {
        Ok(document) => {
            tracing::info!(
                document_id = %document.id,
                key = %key,
                size = file_size,
                "Stored document"
            );
            Ok(document)
        }
        Err(e) => {
            tracing::error!(error = %e, key = %key, "Failed to record document; removing file");
            if let Err(cleanup) = state.blobs().delete(&key).await {
                tracing::warn!(error = %cleanup, key = %key, "Failed to remove orphaned file");
            }
            Err(e.into())
        }
    }
}

/// Store every file of an upload form for a client-role user.
///
/// The user's client record is created on first upload.
pub async fn store_upload(state: &AppState, uploader: &User, form: UploadForm) -> Result<Vec<Document>, PortalError> {
    if form.document_type.is_empty() {
        return Err(PortalError::InvalidRequest("Please select a document type".to_string()));
    }
    if form.files.is_empty() {
        return Err(PortalError::InvalidRequest("Please choose at least one file".to_string()));
    }

    let repo = state.repo();
    let client = match repo.find_client_by_owner(uploader.id).await? {
        Some(client) => client,
        None => {
            let client = repo
                .create_client(uploader.display_name(), Some(uploader.id))
                .await?;
            tracing::info!(client_id = %client.id, user_id = %uploader.id, "Created client record on first upload");
            client
        }
    };

    let mut stored = Vec::with_capacity(form.files.len());
    for file in form.files {
        stored.push(store_file(state, uploader, client.id, &form.document_type, file).await?);
    }
    Ok(stored)
}

/// `POST /client/upload-documents`
pub async fn upload_documents(
    State(state): State<AppState>,
    current: CurrentUser,
    multipart: Multipart,
) -> Response {
    let result = match read_form(multipart, state.portal().max_upload_megabytes()).await {
        Ok(form) => store_upload(&state, &current.user, form).await,
        Err(e) => Err(e),
    };
    let target = match result {
        Ok(documents) => with_flash(
            "/client/my-documents",
            "notice",
            &format!("Uploaded {} document(s)", documents.len()),
        ),
        Err(e) => {
            let message = match &e {
                PortalError::InvalidRequest(message) => message.clone(),
                _ => {
                    tracing::error!(error = %e, user_id = %current.user.id, "Upload failed");
                    "Upload failed. Please try again.".to_string()
                }
            };
            with_flash(UPLOAD_PAGE, "error", &message)
        }
    };
    Redirect::to(&target).into_response()
}

/// Whether a user may download a document.
pub fn can_download(current: &CurrentUser, document: &Document) -> bool {
    match current.role {
        Role::Admin | Role::ServiceCenter => true,
        Role::Client => document.uploaded_by == current.user.id,
    }
}

/// `GET /documents/{id}/file`
pub async fn download_document(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, PortalError> {
    let document = state
        .repo()
        .get_document(id)
        .await?
        .ok_or_else(|| PortalError::NotFound(format!("document {id}")))?;
    if !can_download(&current, &document) {
        tracing::warn!(document_id = %id, user_id = %current.user.id, "Download denied");
        return Err(PortalError::AccessDenied);
    }

    let bytes = state.blobs().get(&document.file_url).await?;
    let content_type = document
        .content_type
        .clone()
        .unwrap_or_else(|| {
            mime_guess::from_path(&document.file_name)
                .first_or_octet_stream()
                .to_string()
        });
    let disposition = format!(
        r#"attachment; filename="{}""#,
        document.file_name.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
