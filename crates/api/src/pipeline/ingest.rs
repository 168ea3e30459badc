//! Streaming ingest of a client multipart upload into the object store.
//!
//! Only the first part that carries a file name is consumed. Its chunks are
//! forwarded through a bounded channel to a spawned upload task, so the
//! request body is never buffered whole. Text parts before it are skipped and
//! anything after it is left unread.

use std::io;
use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::Bytes;
use clipstudio_cloud::{ObjectStore, StoredObject, UploadOptions};
use clipstudio_core::completion::CompletionToken;
use clipstudio_core::types::DbId;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{AppError, AppResult};

/// Chunks buffered between the request body and the upload task.
const INGEST_CHANNEL_CAPACITY: usize = 8;

/// Progress of a multipart ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestState {
    AwaitingFile,
    Streaming { file_name: String },
    Handled,
}

/// The uploaded file and where it landed.
#[derive(Debug)]
pub struct IngestedFile {
    pub file_name: String,
    pub stored: StoredObject,
}

/// Stream the first file part of `multipart` into `store` under the user's
/// folder.
///
/// Returns `400 No video file uploaded` when the body holds no file part.
pub async fn ingest_first_file(
    multipart: &mut Multipart,
    store: Arc<dyn ObjectStore>,
    user_id: DbId,
) -> AppResult<IngestedFile> {
    let mut state = IngestState::AwaitingFile;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            tracing::debug!(
                field = field.name().unwrap_or_default(),
                "Skipping non-file multipart part"
            );
            continue;
        };

        state = IngestState::Streaming {
            file_name: file_name.clone(),
        };
        tracing::debug!(?state, user_id, "Ingesting upload");

        let options = UploadOptions::video_for_user(user_id, file_name.clone());
        let stored = stream_field(field, store, options).await?;

        state = IngestState::Handled;
        tracing::debug!(?state, user_id, url = %stored.secure_url, "Ingest finished");
        return Ok(IngestedFile { file_name, stored });
    }

    debug_assert_eq!(state, IngestState::AwaitingFile);
    Err(AppError::BadRequest("No video file uploaded".into()))
}

async fn stream_field(
    mut field: Field<'_>,
    store: Arc<dyn ObjectStore>,
    options: UploadOptions,
) -> AppResult<StoredObject> {
    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(INGEST_CHANNEL_CAPACITY);
    let completion = Arc::new(CompletionToken::new());

    let upload = tokio::spawn({
        let completion = Arc::clone(&completion);
        async move {
            let result = store
                .upload(Box::pin(ReceiverStream::new(rx)), &options)
                .await;
            let settled = match &result {
                Ok(_) => completion.complete(),
                Err(_) => completion.fail(),
            };
            if let Err(already) = settled {
                tracing::warn!(error = %already, "Upload settled after ingest was abandoned");
            }
            result
        }
    });

    let mut received: u64 = 0;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                received += chunk.len() as u64;
                // A closed channel means the store gave up; its result says why.
                if tx.send(Ok(chunk)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, received, "Client upload aborted");
                let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
                if completion.fail().is_err() {
                    tracing::debug!("Upload already settled when the body failed");
                }
                upload.abort();
                return Err(multipart_error(e));
            }
        }
    }
    drop(tx);

    let stored = upload
        .await
        .map_err(|e| AppError::InternalError(format!("upload task failed: {e}")))??;
    tracing::info!(bytes = received, url = %stored.secure_url, "Stored client upload");
    Ok(stored)
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}
