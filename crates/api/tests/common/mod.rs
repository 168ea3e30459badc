#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use clipstudio_api::auth::jwt::{generate_access_token, JwtConfig};
use clipstudio_api::auth::password::hash_password;
use clipstudio_api::config::{ExportConfig, ServerConfig};
use clipstudio_api::router::build_app_router;
use clipstudio_api::state::AppState;
use clipstudio_cloud::{
    ByteStream, CloudinaryConfig, DelegateClient, DelegateEndpoints, Downloader, ObjectStore,
    StorageError, StoredObject, UploadOptions,
};
use clipstudio_core::ffmpeg::EncoderConfig;
use clipstudio_db::models::user::{CreateUser, User};
use clipstudio_db::repositories::UserRepo;
use futures::StreamExt;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const TEST_PASSWORD: &str = "test_password_123!";

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

/// In-memory object store recording every upload.
#[derive(Default)]
pub struct MemoryStore {
    pub uploads: Mutex<Vec<(UploadOptions, Vec<u8>)>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(
        &self,
        mut body: ByteStream,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError> {
        let mut bytes = Vec::new();
        while let Some(chunk) = body.next().await {
            bytes.extend_from_slice(&chunk.expect("body chunk"));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((options.clone(), bytes));
        Ok(StoredObject {
            secure_url: format!(
                "https://store.test/{}/{}-{}",
                options.folder,
                uploads.len(),
                options.file_name
            ),
            public_id: options.file_name.clone(),
            bytes: None,
        })
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing listens on.
pub fn unreachable_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Write an executable `/bin/sh` script standing in for the encoder.
#[cfg(unix)]
pub fn fake_encoder(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Export settings rooted at `tmp_dir` with the real encoder and a short
/// cleanup grace.
pub fn export_config(tmp_dir: &Path) -> ExportConfig {
    ExportConfig {
        encoder: EncoderConfig::default(),
        tmp_dir: tmp_dir.to_path_buf(),
        cleanup_grace: Duration::from_millis(50),
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(ml_base: &str, export: ExportConfig) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        max_upload_bytes: 16 * 1024 * 1024,
        password_min_length: 8,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_mins: 60,
        },
        cloudinary: CloudinaryConfig {
            cloud_name: "test".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            upload_url: unreachable_base(),
        },
        delegates: DelegateEndpoints::with_base(ml_base),
        export,
    }
}

/// Full application router with no reachable ML service and a throwaway
/// export root.
pub fn build_test_app(pool: PgPool) -> Router {
    let export = export_config(&std::env::temp_dir().join("clipstudio-api-tests"));
    build_test_app_with(
        pool,
        &unreachable_base(),
        export,
        Arc::new(MemoryStore::default()),
    )
}

/// Full application router wired to the given doubles. Uses the same
/// middleware stack as production.
pub fn build_test_app_with(
    pool: PgPool,
    ml_base: &str,
    export: ExportConfig,
    store: Arc<MemoryStore>,
) -> Router {
    let config = test_config(ml_base, export);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        object_store: store,
        delegates: Arc::new(DelegateClient::new(config.delegates.clone())),
        downloader: Arc::new(Downloader::new()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] and return it with a valid token.
pub async fn create_user_with_token(pool: &PgPool, username: &str) -> (User, String) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@test.com"),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        },
    )
    .await
    .expect("user creation should succeed");

    let token = generate_access_token(
        user.id,
        &user.username,
        &user.email,
        &JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_mins: 60,
        },
    )
    .expect("token generation should succeed");
    (user, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, None, &body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), &body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), &body)).await
}

const BOUNDARY: &str = "clipstudio-test-boundary";

/// POST a multipart body built from `(name, file_name, content)` parts.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    parts: &[(&str, Option<&str>, &str)],
) -> Response {
    let mut body = String::new();
    for (name, file_name, content) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: video/mp4\r\n\r\n"
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Number of entries directly under `dir`.
pub fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
