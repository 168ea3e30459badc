//! Handler for `POST /video/export` (timeline concatenation).

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use clipstudio_core::clip::{validate_clips, ExportClip};
use serde_json::Value;

use super::params::validation;
use crate::error::{AppError, AppResult};
use crate::pipeline::export::concat_clips;
use crate::state::AppState;

/// POST /video/export
///
/// Body `{clips: [{src, ...}]}`. Clips are joined in array order without
/// re-encoding and streamed back as `exported_video.mp4`. Nothing touches the
/// file system until the list has been validated.
pub async fn export_video(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    let clips: Vec<ExportClip> = match body.get("clips") {
        Some(Value::Array(items)) => serde_json::from_value(Value::Array(items.clone()))
            .map_err(|e| AppError::BadRequest(format!("Invalid clips data: {e}")))?,
        _ => return Err(validation("Invalid clips data")),
    };
    validate_clips(&clips)?;

    tracing::info!(clips = clips.len(), "Exporting timeline");
    let exported = concat_clips(&state.config.export, &state.downloader, &clips).await?;
    Ok(exported.stream_response("exported_video.mp4").await?)
}
