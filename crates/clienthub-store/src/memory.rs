//! In-memory repository.
//!
//! Backs the portal's router tests and `storage.backend: memory` development
//! runs. State lives behind a single lock and is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clienthub_core::model::{
    Client, Document, DocumentStatus, NewDocument, NewUser, Role, Session, User,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::StoreError;
use crate::repository::Repository;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    credentials: HashMap<Uuid, String>,
    sessions: HashMap<String, Session>,
    clients: Vec<Client>,
    documents: Vec<Document>,
}

/// Repository kept entirely in process memory.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

fn newest_first<T>(mut rows: Vec<T>, at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(at(row)));
    rows
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn count_users(&self) -> Result<i64, StoreError> {
        Ok(self.read()?.users.len() as i64)
    }

    async fn create_user(&self, user: NewUser, password_hash: String) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Conflict(format!(
                "A user with email {} already exists",
                user.email
            )));
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            full_name: user.full_name,
            role: user.role.as_str().to_string(),
            created_at: Utc::now(),
        };
        tables.credentials.insert(created.id, password_hash);
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let tables = self.read()?;
        let Some(user) = tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
        else {
            return Ok(None);
        };
        Ok(tables
            .credentials
            .get(&user.id)
            .map(|hash| (user.clone(), hash.clone())))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self.read()?.users.clone();
        Ok(newest_first(users, |u| u.created_at))
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.role = role.as_str().to_string();
        Ok(user.clone())
    }

    async fn create_session(&self, session: Session) -> Result<(), StoreError> {
        self.write()?.sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.read()?.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.write()?.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.write()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn create_client(
        &self,
        business_name: &str,
        created_by: Option<Uuid>,
    ) -> Result<Client, StoreError> {
        let client = Client {
            id: Uuid::new_v4(),
            business_name: business_name.to_string(),
            created_at: Utc::now(),
            created_by,
        };
        self.write()?.clients.push(client.clone());
        Ok(client)
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        Ok(self.read()?.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn find_client_by_owner(&self, user_id: Uuid) -> Result<Option<Client>, StoreError> {
        Ok(self
            .read()?
            .clients
            .iter()
            .find(|c| c.created_by == Some(user_id))
            .cloned())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let clients = self.read()?.clients.clone();
        Ok(newest_first(clients, |c| c.created_at))
    }

    async fn delete_client(&self, id: Uuid) -> Result<Vec<Document>, StoreError> {
        let mut tables = self.write()?;
        let before = tables.clients.len();
        tables.clients.retain(|c| c.id != id);
        if tables.clients.len() == before {
            return Err(StoreError::NotFound(format!("client {id}")));
        }
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut tables.documents)
            .into_iter()
            .partition(|d| d.client_id == Some(id));
        tables.documents = kept;
        Ok(removed)
    }

    async fn insert_document(&self, document: NewDocument) -> Result<Document, StoreError> {
        let mut tables = self.write()?;
        if !tables.users.iter().any(|u| u.id == document.uploaded_by) {
            return Err(StoreError::NotFound(format!("user {}", document.uploaded_by)));
        }
        if let Some(client_id) = document.client_id
            && !tables.clients.iter().any(|c| c.id == client_id)
        {
            return Err(StoreError::NotFound(format!("client {client_id}")));
        }
        let created = Document {
            id: Uuid::new_v4(),
            client_id: document.client_id,
            uploaded_by: document.uploaded_by,
            file_name: document.file_name,
            file_url: document.file_url,
            document_type: document.document_type,
            status: DocumentStatus::Pending,
            uploaded_at: Utc::now(),
            file_size: document.file_size,
            content_type: document.content_type,
            reviewed_by: None,
            reviewed_at: None,
        };
        tables.documents.push(created.clone());
        Ok(created)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.read()?.documents.iter().find(|d| d.id == id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StoreError> {
        let documents = self.read()?.documents.clone();
        Ok(newest_first(documents, |d| d.uploaded_at))
    }

    async fn list_documents_by_uploader(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        let documents: Vec<_> = self
            .read()?
            .documents
            .iter()
            .filter(|d| d.uploaded_by == user_id)
            .cloned()
            .collect();
        Ok(newest_first(documents, |d| d.uploaded_at))
    }

    async fn list_documents_by_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        let documents: Vec<_> = self
            .read()?
            .documents
            .iter()
            .filter(|d| d.client_id == Some(client_id))
            .cloned()
            .collect();
        Ok(newest_first(documents, |d| d.uploaded_at))
    }

    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        reviewed_by: Option<Uuid>,
    ) -> Result<Document, StoreError> {
        let mut tables = self.write()?;
        let document = tables
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("document {id}")))?;
        document.status = status;
        document.reviewed_by = reviewed_by;
        document.reviewed_at = Some(Utc::now());
        Ok(document.clone())
    }
}
