//! Repository trait over the relational store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clienthub_core::model::{
    Client, Document, DocumentStatus, NewDocument, NewUser, Role, Session, User,
};
use uuid::Uuid;

use crate::error::StoreError;

/// Access to users, sessions, clients and documents.
///
/// Implemented by [`crate::PgRepository`] for production and
/// [`crate::MemoryRepository`] for tests and local development.
#[async_trait]
pub trait Repository: Send + Sync {
    // ------------------------------------------------------------------
    // Users and credentials
    // ------------------------------------------------------------------

    async fn count_users(&self) -> Result<i64, StoreError>;

    /// Create a user profile and its credential in one step.
    ///
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser, password_hash: String) -> Result<User, StoreError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// User and password hash for sign-in.
    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn update_user_role(&self, id: Uuid, role: Role) -> Result<User, StoreError>;

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    async fn create_session(&self, session: Session) -> Result<(), StoreError>;

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError>;

    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    /// Remove sessions that expired before `now`. Returns the number removed.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    async fn create_client(
        &self,
        business_name: &str,
        created_by: Option<Uuid>,
    ) -> Result<Client, StoreError>;

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, StoreError>;

    /// The client record created by a user, if any.
    async fn find_client_by_owner(&self, user_id: Uuid) -> Result<Option<Client>, StoreError>;

    /// All clients, newest first.
    async fn list_clients(&self) -> Result<Vec<Client>, StoreError>;

    /// Delete a client and its documents. Returns the deleted documents so
    /// their blobs can be removed.
    async fn delete_client(&self, id: Uuid) -> Result<Vec<Document>, StoreError>;

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    async fn insert_document(&self, document: NewDocument) -> Result<Document, StoreError>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// All documents, newest upload first.
    async fn list_documents(&self) -> Result<Vec<Document>, StoreError>;

    /// Documents uploaded by a user, newest upload first.
    async fn list_documents_by_uploader(&self, user_id: Uuid)
    -> Result<Vec<Document>, StoreError>;

    /// Documents attached to a client, newest upload first.
    async fn list_documents_by_client(&self, client_id: Uuid)
    -> Result<Vec<Document>, StoreError>;

    /// Write any status. No transition rules are applied.
    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        reviewed_by: Option<Uuid>,
    ) -> Result<Document, StoreError>;
}
