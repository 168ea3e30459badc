//! Handlers for the `/gif` resource (prompt-driven generation, re-encode
//! export).

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use clipstudio_cloud::UploadOptions;
use clipstudio_core::clip::validate_source_url;
use clipstudio_core::delegate::DelegateRequest;
use clipstudio_db::models::gif::{CreateGif, Gif};
use clipstudio_db::repositories::GifRepo;
use serde::Serialize;
use serde_json::Value;

use super::params::validation;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::pipeline::export::reencode_single;
use crate::pipeline::relay::relay;
use crate::state::AppState;

/// Object name given to generated clips in the store.
const GENERATED_FILE_NAME: &str = "generated.mp4";

#[derive(Debug, Serialize)]
pub struct GifResponse {
    pub success: bool,
    pub video: Gif,
}

/// POST /gif/generate
///
/// Sends the prompt to the generator and records the stored result as a new
/// gif owned by the caller, named after the prompt.
pub async fn generate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<GifResponse>> {
    let prompt = match body.get("prompt") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => return Err(validation("Missing prompt")),
    };

    let request = DelegateRequest::GifGeneration {
        prompt: prompt.clone(),
    };
    let options = UploadOptions::video_for_user(auth.user_id, GENERATED_FILE_NAME);
    tracing::info!(user_id = auth.user_id, "Generating gif");

    let pool = state.pool.clone();
    let user_id = auth.user_id;
    let gif = relay(
        &state.delegates,
        state.object_store.as_ref(),
        &request,
        &options,
        move |stored| async move {
            GifRepo::create(
                &pool,
                &CreateGif {
                    user_id,
                    video_url: stored.secure_url,
                    video_name: prompt,
                },
            )
            .await
        },
    )
    .await?;

    tracing::info!(gif_id = gif.id, user_id, "Gif generated");
    Ok(Json(GifResponse {
        success: true,
        video: gif,
    }))
}

/// POST /gif/export
///
/// Body `{gif: {src}}`. Downloads the clip, re-encodes it to H.264 and streams
/// it back as `exported.mp4`.
pub async fn export(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    let src = body
        .get("gif")
        .and_then(|gif| gif.get("src"))
        .and_then(Value::as_str)
        .filter(|src| !src.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Invalid gif data".into()))?;
    validate_source_url(src).map_err(|msg| validation(&msg))?;

    let exported = reencode_single(&state.config.export, &state.downloader, src).await?;
    tracing::info!(size = exported.size(), "Gif export ready");
    Ok(exported.stream_response("exported.mp4").await?)
}
