//! Durable media storage.
//!
//! [`ObjectStore`] is the seam the API layer uploads through; the production
//! implementation is [`CloudinaryStore`], which streams the body to
//! Cloudinary's signed upload endpoint without buffering it locally.

use async_trait::async_trait;
use bytes::Bytes;
use clipstudio_core::types::DbId;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::ByteStream;

/// Chunks buffered between the source stream and the HTTP body.
const UPLOAD_CHANNEL_CAPACITY: usize = 16;

/// Resource type every upload is tagged with.
pub const VIDEO_RESOURCE_TYPE: &str = "video";

/// Errors from the object store layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The HTTP request itself failed (network, DNS, TLS, aborted body).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store returned a non-2xx status code.
    #[error("object store error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The store accepted the upload but returned no URL.
    #[error("object store response carried no secure_url")]
    MissingUrl,
}

/// Where and how an upload is filed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    pub resource_type: &'static str,
    pub file_name: String,
}

impl UploadOptions {
    /// Video upload filed under the owning user's folder (`user{id}`).
    pub fn video_for_user(user_id: DbId, file_name: impl Into<String>) -> Self {
        Self {
            folder: format!("user{user_id}"),
            resource_type: VIDEO_RESOURCE_TYPE,
            file_name: file_name.into(),
        }
    }
}

/// The durable object produced by a successful upload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoredObject {
    pub secure_url: String,
    #[serde(default)]
    pub public_id: String,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Streams bytes into durable storage and returns where they landed.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        body: ByteStream,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError>;
}

// ---------------------------------------------------------------------------
// Cloudinary
// ---------------------------------------------------------------------------

/// Credentials and endpoint for a Cloudinary account.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// API base, e.g. `https://api.cloudinary.com/v1_1`.
    pub upload_url: String,
}

/// [`ObjectStore`] backed by Cloudinary's signed upload API.
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, resource_type: &str) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.upload_url.trim_end_matches('/'),
            self.config.cloud_name,
            resource_type
        )
    }
}

/// Compute an upload signature: parameters sorted by name, joined as
/// `k=v&k=v`, the secret appended, SHA-256 hex digest.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{:x}", Sha256::digest(format!("{to_sign}{api_secret}").as_bytes()))
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn upload(
        &self,
        body: ByteStream,
        options: &UploadOptions,
    ) -> Result<StoredObject, StorageError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", &options.folder), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        // Forward chunks through a channel so the request body only holds the
        // receiving end.
        let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(UPLOAD_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut body = body;
            while let Some(item) = body.next().await {
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        let part = Part::stream(reqwest::Body::wrap_stream(ReceiverStream::new(rx)))
            .file_name(options.file_name.clone());
        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", options.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part);

        tracing::debug!(
            folder = %options.folder,
            file_name = %options.file_name,
            "Streaming upload to object store"
        );

        let response = self
            .client
            .post(self.endpoint(options.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StorageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let stored: StoredObject = response.json().await?;
        if stored.secure_url.is_empty() {
            return Err(StorageError::MissingUrl);
        }
        tracing::info!(url = %stored.secure_url, "Upload stored");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_order_independent() {
        let a = sign_params(&[("timestamp", "1700000000"), ("folder", "user1")], "secret");
        let b = sign_params(&[("folder", "user1"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_matches_sha256_of_sorted_params() {
        let expected = format!(
            "{:x}",
            Sha256::digest(b"folder=user1&timestamp=1700000000secret")
        );
        assert_eq!(
            sign_params(&[("timestamp", "1700000000"), ("folder", "user1")], "secret"),
            expected
        );
    }

    #[test]
    fn video_options_use_user_folder() {
        let options = UploadOptions::video_for_user(42, "clip.mp4");
        assert_eq!(options.folder, "user42");
        assert_eq!(options.resource_type, "video");
        assert_eq!(options.file_name, "clip.mp4");
    }

    #[test]
    fn endpoint_joins_cloud_and_resource_type() {
        let store = CloudinaryStore::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "k".into(),
            api_secret: "s".into(),
            upload_url: "https://api.cloudinary.com/v1_1/".into(),
        });
        assert_eq!(
            store.endpoint("video"),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
    }
}
