//! Postgres repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clienthub_core::config::DatabaseConfig;
use clienthub_core::model::{
    Client, Document, DocumentStatus, NewDocument, NewUser, Role, Session, User,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::error::StoreError;
use crate::repository::Repository;

const USER_COLUMNS: &str = "id, email, full_name, role, created_at";
const CLIENT_COLUMNS: &str = "id, business_name, created_at, created_by";
const DOCUMENT_COLUMNS: &str = "id, client_id, uploaded_by, file_name, file_url, document_type, \
     status, uploaded_at, file_size, content_type, reviewed_by, reviewed_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    full_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, FromRow)]
struct SessionRow {
    token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            token: row.token,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: Uuid,
    business_name: String,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            business_name: row.business_name,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    client_id: Option<Uuid>,
    uploaded_by: Uuid,
    file_name: String,
    file_url: String,
    document_type: String,
    status: String,
    uploaded_at: DateTime<Utc>,
    file_size: i64,
    content_type: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            client_id: row.client_id,
            uploaded_by: row.uploaded_by,
            file_name: row.file_name,
            file_url: row.file_url,
            document_type: row.document_type,
            status: DocumentStatus::parse(&row.status),
            uploaded_at: row.uploaded_at,
            file_size: row.file_size,
            content_type: row.content_type,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
        }
    }
}

fn conflict_on_unique(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return StoreError::Conflict(what());
    }
    StoreError::Database(err)
}

/// Repository backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the configured connection settings.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.connection_string())
            .await?;
        tracing::info!(database = %config.redacted_target(), "Connected to Postgres");
        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn count_users(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_user(&self, user: NewUser, password_hash: String) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;
        let email = user.email.clone();
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (id, email, full_name, role, created_at) \
             VALUES ($1, $2, $3, $4, now()) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("A user with email {email} already exists")))?;

        sqlx::query("INSERT INTO credentials (user_id, password_hash) VALUES ($1, $2)")
            .bind(row.id)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            "SELECT u.id, u.email, u.full_name, u.role, u.created_at, c.password_hash \
             FROM users u JOIN credentials c ON c.user_id = u.id \
             WHERE lower(u.email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::from)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn create_session(&self, session: Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_client(
        &self,
        business_name: &str,
        created_by: Option<Uuid>,
    ) -> Result<Client, StoreError> {
        let row: ClientRow = sqlx::query_as(&format!(
            "INSERT INTO clients (id, business_name, created_at, created_by) \
             VALUES ($1, $2, now(), $3) RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(business_name)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let row: Option<ClientRow> =
            sqlx::query_as(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Client::from))
    }

    async fn find_client_by_owner(&self, user_id: Uuid) -> Result<Option<Client>, StoreError> {
        let row: Option<ClientRow> = sqlx::query_as(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE created_by = $1 \
             ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Client::from))
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let rows: Vec<ClientRow> = sqlx::query_as(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    async fn delete_client(&self, id: Uuid) -> Result<Vec<Document>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let documents: Vec<DocumentRow> = sqlx::query_as(&format!(
            "DELETE FROM documents WHERE client_id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(format!("client {id}")));
        }

        tx.commit().await?;
        Ok(documents.into_iter().map(Document::from).collect())
    }

    async fn insert_document(&self, document: NewDocument) -> Result<Document, StoreError> {
        let row: DocumentRow = sqlx::query_as(&format!(
            "INSERT INTO documents \
             (id, client_id, uploaded_by, file_name, file_url, document_type, status, \
              uploaded_at, file_size, content_type) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', now(), $7, $8) \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(document.client_id)
        .bind(document.uploaded_by)
        .bind(&document.file_name)
        .bind(&document.file_url)
        .bind(&document.document_type)
        .bind(document.file_size)
        .bind(&document.content_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY uploaded_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn list_documents_by_uploader(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE uploaded_by = $1 \
             ORDER BY uploaded_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn list_documents_by_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE client_id = $1 \
             ORDER BY uploaded_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        reviewed_by: Option<Uuid>,
    ) -> Result<Document, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "UPDATE documents SET status = $2, reviewed_by = $3, reviewed_at = now() \
             WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(reviewed_by)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::from)
            .ok_or_else(|| StoreError::NotFound(format!("document {id}")))
    }
}
