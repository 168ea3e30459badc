//! Local export: fetch remote clips, run the encoder, stream the result.
//!
//! Each job works inside its own [`ExportWorkspace`]. A failure before the
//! response exists removes the directory immediately; on success the guard
//! travels with the response body and the directory goes away shortly after
//! the body is dropped.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use clipstudio_cloud::{DownloadError, Downloader};
use clipstudio_core::clip::ExportClip;
use clipstudio_core::ffmpeg::{self, EncoderError};
use clipstudio_core::workspace::ExportWorkspace;
use futures::future::try_join_all;
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use crate::config::ExportConfig;

const MANIFEST_NAME: &str = "concat.txt";
const OUTPUT_NAME: &str = "output.mp4";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("workspace I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Encoder(#[from] EncoderError),
}

/// A finished export waiting to be streamed.
#[derive(Debug)]
pub struct ExportedFile {
    workspace: ExportWorkspace,
    path: PathBuf,
    size: u64,
}

impl ExportedFile {
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Stream the file as an `attachment` download named `file_name`.
    ///
    /// The workspace guard is moved into the body stream, so the directory
    /// outlives the last chunk sent.
    pub async fn stream_response(self, file_name: &str) -> Result<Response, ExportError> {
        let ExportedFile {
            workspace,
            path,
            size,
        } = self;

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                workspace.cleanup().await;
                return Err(e.into());
            }
        };

        let stream = ReaderStream::new(file).map(move |chunk| {
            let _guard = &workspace;
            chunk
        });

        Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "video/mp4".to_string()),
                (header::CONTENT_LENGTH, size.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ),
            ],
            Body::from_stream(stream),
        )
            .into_response())
    }
}

/// Download `clips` concurrently and join them in order without re-encoding.
///
/// The list must already be validated as non-empty.
pub async fn concat_clips(
    config: &ExportConfig,
    downloader: &Downloader,
    clips: &[ExportClip],
) -> Result<ExportedFile, ExportError> {
    let workspace = ExportWorkspace::create(&config.tmp_dir, config.cleanup_grace).await?;

    let inputs: Vec<PathBuf> = (0..clips.len())
        .map(|i| workspace.file(&format!("clip{i}.mp4")))
        .collect();
    let manifest = workspace.file(MANIFEST_NAME);
    let output = workspace.file(OUTPUT_NAME);

    let job = async {
        try_join_all(
            clips
                .iter()
                .zip(&inputs)
                .map(|(clip, dest)| downloader.download_to_file(&clip.src, dest)),
        )
        .await?;
        tracing::debug!(clips = clips.len(), "Downloaded export clips");

        ffmpeg::write_concat_manifest(&manifest, &inputs).await?;
        let size = ffmpeg::concat_stream_copy(&config.encoder, &manifest, &inputs, &output).await?;
        Ok::<_, ExportError>(size)
    };

    let outcome = job.await;
    finish(workspace, output, outcome).await
}

/// Download one clip and re-encode it to H.264.
pub async fn reencode_single(
    config: &ExportConfig,
    downloader: &Downloader,
    src: &str,
) -> Result<ExportedFile, ExportError> {
    let workspace = ExportWorkspace::create(&config.tmp_dir, config.cleanup_grace).await?;
    let input = workspace.file("input.mp4");
    let output = workspace.file(OUTPUT_NAME);

    let job = async {
        downloader.download_to_file(src, &input).await?;
        let size = ffmpeg::transcode_h264(&config.encoder, &input, &output).await?;
        Ok::<_, ExportError>(size)
    };

    let outcome = job.await;
    finish(workspace, output, outcome).await
}

async fn finish(
    workspace: ExportWorkspace,
    path: PathBuf,
    outcome: Result<u64, ExportError>,
) -> Result<ExportedFile, ExportError> {
    match outcome {
        Ok(size) => {
            tracing::info!(dir = %workspace.path().display(), size, "Export encoded");
            Ok(ExportedFile {
                workspace,
                path,
                size,
            })
        }
        Err(e) => {
            workspace.cleanup().await;
            Err(e)
        }
    }
}
