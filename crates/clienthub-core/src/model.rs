//! Domain records shared by the store, auth and portal crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Roles
// =============================================================================

/// The three portal roles.
///
/// Roles are stored as free text. Older rows use `Admin`, `Client` and
/// `Service_Center`; newer rows use the lowercase slugs. Both resolve through
/// [`Role::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Client,
    Admin,
    ServiceCenter,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Client, Role::Admin, Role::ServiceCenter];

    /// Map a stored role string to a role. Unknown strings yield `None`.
    pub fn normalize(raw: &str) -> Option<Role> {
        match raw.trim() {
            "Admin" | "admin" | "ADMIN" => Some(Role::Admin),
            "Client" | "client" | "CLIENT" => Some(Role::Client),
            "Service_Center" | "service_center" | "service-center" | "Service Center"
            | "service center" | "service" | "Service" | "SERVICE_CENTER" => {
                Some(Role::ServiceCenter)
            }
            _ => None,
        }
    }

    /// Canonical slug written for new users.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Admin => "admin",
            Role::ServiceCenter => "service-center",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::Admin => "Admin",
            Role::ServiceCenter => "Service Center",
        }
    }

    /// Landing page after sign-in.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Client => "/client",
            Role::Admin => "/admin",
            Role::ServiceCenter => "/service-center",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Document status
// =============================================================================

/// Review status of a document.
///
/// Stored as free text with no transition rules. Values outside the canonical
/// set are kept verbatim in [`DocumentStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Completed,
    Other(String),
}

impl DocumentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => DocumentStatus::Pending,
            "under_review" | "under-review" | "under review" => DocumentStatus::UnderReview,
            "approved" => DocumentStatus::Approved,
            "rejected" => DocumentStatus::Rejected,
            "completed" => DocumentStatus::Completed,
            _ => DocumentStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::UnderReview => "under_review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Other(raw) => raw,
        }
    }

    /// Human-readable label, e.g. `Under Review`.
    pub fn label(&self) -> String {
        match self {
            DocumentStatus::Pending => "Pending".to_string(),
            DocumentStatus::UnderReview => "Under Review".to_string(),
            DocumentStatus::Approved => "Approved".to_string(),
            DocumentStatus::Rejected => "Rejected".to_string(),
            DocumentStatus::Completed => "Completed".to_string(),
            DocumentStatus::Other(raw) => raw.replace(['_', '-'], " "),
        }
    }

    /// Whether the status marks an onboarding step as done.
    pub fn is_done(&self) -> bool {
        matches!(self, DocumentStatus::Approved | DocumentStatus::Completed)
    }
}

impl From<String> for DocumentStatus {
    fn from(raw: String) -> Self {
        DocumentStatus::parse(&raw)
    }
}

impl From<DocumentStatus> for String {
    fn from(status: DocumentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Records
// =============================================================================

/// A portal account profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    /// Role as stored. Use [`User::role`] for the normalized value.
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::normalize(&self.role)
    }

    /// Name to greet the user with, falling back to the email address.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }
}

/// Fields for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// A business being onboarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub business_name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Metadata for an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub file_name: String,
    /// Storage key of the blob.
    pub file_url: String,
    /// Free-text classification, matched against onboarding steps.
    pub document_type: String,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Fields for recording an upload.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub client_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub document_type: String,
    pub file_size: i64,
    pub content_type: Option<String>,
}

/// A signed-in browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Format a byte count the way the document tables show it.
pub fn format_file_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let bytes = bytes.max(0) as f64;
    if bytes >= MB {
        format!("{:.2} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_normalize_aliases() {
        assert_eq!(Role::normalize("Admin"), Some(Role::Admin));
        assert_eq!(Role::normalize("admin"), Some(Role::Admin));
        assert_eq!(Role::normalize("Client"), Some(Role::Client));
        assert_eq!(Role::normalize("Service_Center"), Some(Role::ServiceCenter));
        assert_eq!(Role::normalize("service-center"), Some(Role::ServiceCenter));
        assert_eq!(Role::normalize("service"), Some(Role::ServiceCenter));
        assert_eq!(Role::normalize(" client "), Some(Role::Client));
    }

    #[test]
    fn test_role_normalize_unknown() {
        assert_eq!(Role::normalize("superuser"), None);
        assert_eq!(Role::normalize(""), None);
    }

    #[test]
    fn test_role_round_trips_through_slug() {
        for role in Role::ALL {
            assert_eq!(Role::normalize(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_role_home_paths() {
        assert_eq!(Role::Client.home_path(), "/client");
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::ServiceCenter.home_path(), "/service-center");
    }

    #[test]
    fn test_document_status_parse() {
        assert_eq!(DocumentStatus::parse("pending"), DocumentStatus::Pending);
        assert_eq!(DocumentStatus::parse("Under_Review"), DocumentStatus::UnderReview);
        assert_eq!(DocumentStatus::parse("APPROVED"), DocumentStatus::Approved);
        assert_eq!(
            DocumentStatus::parse("on_hold"),
            DocumentStatus::Other("on_hold".to_string())
        );
    }

    #[test]
    fn test_document_status_keeps_unknown_values() {
        let status = DocumentStatus::parse("needs_signature");
        assert_eq!(status.as_str(), "needs_signature");
        assert_eq!(status.label(), "needs signature");
        assert!(!status.is_done());
    }

    #[test]
    fn test_document_status_serde_as_string() {
        let json = serde_json::to_string(&DocumentStatus::UnderReview).unwrap();
        assert_eq!(json, "\"under_review\"");
        let parsed: DocumentStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(parsed, DocumentStatus::Approved);
    }

    #[test]
    fn test_user_display_name_falls_back_to_email() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            full_name: "  ".to_string(),
            role: "client".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "a@example.com");
        assert_eq!(user.role(), Some(Role::Client));
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::hours(1)));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }
}
