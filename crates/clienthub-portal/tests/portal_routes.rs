//! Router tests against the in-memory repository and blob store.

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use clienthub_auth::CreateUser;
use clienthub_core::ClientHubConfig;
use clienthub_core::model::{
    Client, Document, DocumentStatus, NewDocument, NewUser, Role, Session, User,
};
use clienthub_portal::{AppState, create_router};
use clienthub_store::{MemoryBlobStore, MemoryRepository, Repository, StoreError};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "clienthub-test-boundary";

struct TestApp {
    router: Router,
    state: AppState,
    blobs: Arc<MemoryBlobStore>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_repo(Arc::new(MemoryRepository::new()))
    }

    fn with_repo(repo: Arc<dyn Repository>) -> Self {
        let blobs = Arc::new(MemoryBlobStore::new());
        let state = AppState::new(ClientHubConfig::default(), repo, blobs.clone());
        Self {
            router: create_router(state.clone()),
            state,
            blobs,
        }
    }

    async fn user(&self, email: &str, role: &str) -> User {
        self.state
            .auth()
            .create_user(CreateUser {
                email: email.to_string(),
                password: "demo123".to_string(),
                full_name: format!("{role} user"),
                role: role.to_string(),
            })
            .await
            .unwrap()
    }

    /// Create a user and return a cookie header for a fresh session.
    async fn session(&self, email: &str, role: &str) -> (User, String) {
        let user = self.user(email, role).await;
        let signed_in = self.state.auth().sign_in(email, "demo123").await.unwrap();
        (user, format!("clienthub_session={}", signed_in.session.token))
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn upload(&self, cookie: &str, document_type: &str, file_name: &str) -> Response {
        self.upload_bytes(cookie, document_type, file_name, b"%PDF-1.4 test")
            .await
    }

    async fn upload_bytes(
        &self,
        cookie: &str,
        document_type: &str,
        file_name: &str,
        contents: &[u8],
    ) -> Response {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"document_type\"\r\n\r\n\
             {document_type}\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/client/upload-documents")
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_healthz() {
    let app = TestApp::new();
    let response = app.get("/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "ok": true, "service": "clienthub" })
    );
}

#[tokio::test]
async fn test_anonymous_request_redirects_to_login() {
    let app = TestApp::new();
    let response = app.get("/admin/all-clients", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?redirect=%2Fadmin%2Fall-clients");
}

#[tokio::test]
async fn test_role_guard() {
    let app = TestApp::new();
    let (_, client) = app.session("client@demo.com", "Client").await;
    let (_, admin) = app.session("admin@demo.com", "Admin").await;
    let (_, service) = app.session("service@demo.com", "Service_Center").await;

    let cases = [
        ("/client", &client, StatusCode::OK),
        ("/client", &admin, StatusCode::FORBIDDEN),
        ("/client", &service, StatusCode::FORBIDDEN),
        ("/admin", &admin, StatusCode::OK),
        ("/admin/settings", &client, StatusCode::FORBIDDEN),
        ("/admin/user-management", &service, StatusCode::FORBIDDEN),
        ("/service-center", &service, StatusCode::OK),
        ("/service-center/review-queue", &client, StatusCode::FORBIDDEN),
        ("/service-center/completed", &admin, StatusCode::FORBIDDEN),
    ];
    for (path, cookie, expected) in cases {
        let response = app.get(path, Some(cookie.as_str())).await;
        assert_eq!(response.status(), expected, "{path}");
        if expected == StatusCode::FORBIDDEN {
            assert_eq!(body_text(response).await, "Access denied");
        }
    }
}

#[tokio::test]
async fn test_login_flow() {
    let app = TestApp::new();
    app.user("client@demo.com", "Client").await;

    let response = app
        .post_form("/login", None, "email=client%40demo.com&password=demo123")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/client");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    let session = cookie.split(';').next().unwrap().to_string();

    // signed-in visitors of the login page go to their home
    let response = app.get("/", Some(session.as_str())).await;
    assert_eq!(location(&response), "/client");

    let response = app.get("/client", Some(session.as_str())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Welcome back"));

    let response = app.post_form("/logout", Some(session.as_str()), "").await;
    assert_eq!(location(&response), "/");
    let response = app.get("/client", Some(session.as_str())).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_failure_and_redirect_param() {
    let app = TestApp::new();
    app.user("admin@demo.com", "Admin").await;

    let response = app
        .post_form(
            "/login",
            None,
            "email=admin%40demo.com&password=wrong&redirect=%2Fadmin%2Fsettings",
        )
        .await;
    assert_eq!(
        location(&response),
        "/?error=invalid&redirect=%2Fadmin%2Fsettings"
    );

    let page = body_text(app.get("/?error=invalid", None).await).await;
    assert!(page.contains("Invalid email or password"));

    let response = app
        .post_form(
            "/login",
            None,
            "email=admin%40demo.com&password=demo123&redirect=%2Fadmin%2Fsettings",
        )
        .await;
    assert_eq!(location(&response), "/admin/settings");
}

#[tokio::test]
async fn test_create_user_api() {
    let app = TestApp::new();
    let (_, admin) = app.session("admin@demo.com", "Admin").await;
    let (_, client) = app.session("client@demo.com", "Client").await;
    let body = json!({
        "email": "new@demo.com",
        "password": "secret1",
        "full_name": "New Person",
        "role": "Service_Center"
    });

    let response = app.post_json("/api/users/create", None, body.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json("/api/users/create", Some(client.as_str()), body.clone())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({ "error": "Access denied" }));

    let response = app
        .post_json("/api/users/create", Some(admin.as_str()), body.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["message"], "User created successfully");
    assert!(created["userId"].is_string());

    let response = app.post_json("/api/users/create", Some(admin.as_str()), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = app.get("/api/users/create", Some(admin.as_str())).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_upload_review_and_progress() {
    let app = TestApp::new();
    let (client_user, client) = app.session("client@demo.com", "Client").await;
    let (_, admin) = app.session("admin@demo.com", "Admin").await;
    let (_, service) = app.session("service@demo.com", "Service_Center").await;

    let response = app.upload(&client, "Profile Verification", "id.pdf").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/client/my-documents?notice="));
    assert_eq!(app.blobs.keys().len(), 1);

    let page = body_text(app.get("/client/my-documents", Some(client.as_str())).await).await;
    assert!(page.contains("id.pdf"));

    let onboarding = body_json(app.get("/api/onboarding", Some(client.as_str())).await).await;
    assert_eq!(onboarding["percentage"], 0.0);
    assert_eq!(onboarding["status"], "pending");
    assert_eq!(onboarding["steps"][0]["status"], "pending");

    // service center verifies the pending client
    let client_record = app
        .state
        .repo()
        .find_client_by_owner(client_user.id)
        .await
        .unwrap()
        .unwrap();
    let response = app
        .post_form(
            &format!("/service-center/clients/{}/verify", client_record.id),
            Some(service.as_str()),
            "",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let documents = app
        .state
        .repo()
        .list_documents_by_client(client_record.id)
        .await
        .unwrap();
    assert_eq!(documents[0].status, DocumentStatus::UnderReview);

    // admin approves
    let response = app
        .post_form(
            &format!("/admin/documents/{}/status", documents[0].id),
            Some(admin.as_str()),
            "status=approved&redirect=%2Fadmin%2Fdocument-review",
        )
        .await;
    assert!(location(&response).starts_with("/admin/document-review?notice="));

    let onboarding = body_json(app.get("/api/onboarding", Some(client.as_str())).await).await;
    assert_eq!(onboarding["percentage"], 25.0);
    assert_eq!(onboarding["completed_steps"], 1);
    assert_eq!(onboarding["steps"][0]["completed"], true);
}

#[tokio::test]
async fn test_download_permissions() {
    let app = TestApp::new();
    let (owner, owner_cookie) = app.session("owner@demo.com", "Client").await;
    let (_, other_cookie) = app.session("other@demo.com", "Client").await;
    let (_, admin) = app.session("admin@demo.com", "Admin").await;

    app.upload(&owner_cookie, "KYC Documents", "passport.pdf").await;
    let documents = app
        .state
        .repo()
        .list_documents_by_uploader(owner.id)
        .await
        .unwrap();
    let uri = format!("/documents/{}/file", documents[0].id);

    let response = app.get(&uri, Some(owner_cookie.as_str())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(body_text(response).await, "%PDF-1.4 test");

    assert_eq!(
        app.get(&uri, Some(other_cookie.as_str())).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.get(&uri, Some(admin.as_str())).await.status(), StatusCode::OK);
    assert_eq!(app.get(&uri, None).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_client_filters_and_delete() {
    let app = TestApp::new();
    let (_, admin) = app.session("admin@demo.com", "Admin").await;
    let (acme_user, acme) = app.session("acme@demo.com", "Client").await;
    app.user("globex@demo.com", "Client").await;
    app.upload(&acme, "KYC Documents", "kyc.pdf").await;

    let page = body_text(app.get("/admin/all-clients?search=ACME", Some(admin.as_str())).await).await;
    assert!(page.contains("acme@demo.com"));
    assert!(!page.contains("globex@demo.com"));

    let acme_client = app
        .state
        .repo()
        .find_client_by_owner(acme_user.id)
        .await
        .unwrap()
        .unwrap();
    let response = app
        .post_form(
            &format!("/admin/clients/{}/delete", acme_client.id),
            Some(admin.as_str()),
            "",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(app.state.repo().get_client(acme_client.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_admin_creates_user_from_form() {
    let app = TestApp::new();
    let (_, admin) = app.session("admin@demo.com", "Admin").await;

    let response = app
        .post_form(
            "/admin/users",
            Some(admin.as_str()),
            "full_name=Jane&email=jane%40demo.com&password=abc&role=client",
        )
        .await;
    assert!(location(&response).starts_with("/admin/user-management?error="));

    let response = app
        .post_form(
            "/admin/users",
            Some(admin.as_str()),
            "full_name=Jane&email=jane%40demo.com&password=abcdef&role=client",
        )
        .await;
    assert!(location(&response).starts_with("/admin/user-management?notice="));
    assert!(
        app.state
            .repo()
            .find_user_by_email("jane@demo.com")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_embedded_stylesheet() {
    let app = TestApp::new();
    let response = app.get("/assets/portal.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/css");
}

#[tokio::test]
async fn test_mutations_are_role_guarded() {
    let app = TestApp::new();
    let (client_user, client) = app.session("client@demo.com", "Client").await;
    let (_, service) = app.session("service@demo.com", "Service_Center").await;
    app.upload(&client, "KYC Documents", "kyc.pdf").await;
    let document = app
        .state
        .repo()
        .list_documents_by_uploader(client_user.id)
        .await
        .unwrap()
        .remove(0);
    let client_record = app
        .state
        .repo()
        .find_client_by_owner(client_user.id)
        .await
        .unwrap()
        .unwrap();

    let status_uri = format!("/admin/documents/{}/status", document.id);
    let response = app
        .post_form(&status_uri, Some(client.as_str()), "status=approved")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Access denied");

    let response = app
        .post_form(
            &format!("/service-center/documents/{}/status", document.id),
            Some(client.as_str()),
            "status=approved",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post_form(
            &format!("/admin/clients/{}/delete", client_record.id),
            Some(service.as_str()),
            "",
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.post_form(&status_uri, None, "status=approved").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let unchanged = app.state.repo().get_document(document.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, DocumentStatus::Pending);
    assert!(
        app.state
            .repo()
            .get_client(client_record.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_upload_over_limit_reports_size() {
    let app = TestApp::new();
    let (client_user, client) = app.session("client@demo.com", "Client").await;
    let oversized = vec![b'x'; 11 * 1024 * 1024];

    let response = app
        .upload_bytes(&client, "KYC Documents", "huge.pdf", &oversized)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/client/upload-documents?error="), "{target}");
    assert!(target.contains("File%20exceeds%20the%2010%20MB%20limit"), "{target}");

    assert!(app.blobs.keys().is_empty());
    assert!(
        app.state
            .repo()
            .list_documents_by_uploader(client_user.id)
            .await
            .unwrap()
            .is_empty()
    );
}

/// Memory repository whose document reads fail.
struct UnreadableDocuments(MemoryRepository);

fn unavailable() -> StoreError {
    StoreError::Storage("documents table unavailable".to_string())
}

#[async_trait]
impl Repository for UnreadableDocuments {
    async fn count_users(&self) -> Result<i64, StoreError> {
        self.0.count_users().await
    }

    async fn create_user(&self, user: NewUser, password_hash: String) -> Result<User, StoreError> {
        self.0.create_user(user, password_hash).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.0.get_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.0.find_user_by_email(email).await
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        self.0.credentials_by_email(email).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.0.list_users().await
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> Result<User, StoreError> {
        self.0.update_user_role(id, role).await
    }

    async fn create_session(&self, session: Session) -> Result<(), StoreError> {
        self.0.create_session(session).await
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        self.0.get_session(token).await
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.0.delete_session(token).await
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.0.delete_expired_sessions(now).await
    }

    async fn create_client(
        &self,
        business_name: &str,
        created_by: Option<Uuid>,
    ) -> Result<Client, StoreError> {
        self.0.create_client(business_name, created_by).await
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        self.0.get_client(id).await
    }

    async fn find_client_by_owner(&self, user_id: Uuid) -> Result<Option<Client>, StoreError> {
        self.0.find_client_by_owner(user_id).await
    }

    async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.0.list_clients().await
    }

    async fn delete_client(&self, id: Uuid) -> Result<Vec<Document>, StoreError> {
        self.0.delete_client(id).await
    }

    async fn insert_document(&self, document: NewDocument) -> Result<Document, StoreError> {
        self.0.insert_document(document).await
    }

    async fn get_document(&self, _id: Uuid) -> Result<Option<Document>, StoreError> {
        Err(unavailable())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StoreError> {
        Err(unavailable())
    }

    async fn list_documents_by_uploader(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        Err(unavailable())
    }

    async fn list_documents_by_client(
        &self,
        _client_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        Err(unavailable())
    }

    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
        reviewed_by: Option<Uuid>,
    ) -> Result<Document, StoreError> {
        self.0.update_document_status(id, status, reviewed_by).await
    }
}

#[tokio::test]
async fn test_onboarding_page_survives_document_read_failure() {
    let app = TestApp::with_repo(Arc::new(UnreadableDocuments(MemoryRepository::new())));
    let (_, client) = app.session("client@demo.com", "Client").await;

    let response = app
        .get("/client/onboarding-status", Some(client.as_str()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("0 of 4 steps completed"));
    assert!(page.contains("width: 0%"));
    assert_eq!(page.matches("text-yellow-800\">Pending</span>").count(), 4);
}
