//! Handlers for the ML processing routes under `/video`.
//!
//! Every operation follows the same shape: validate the body, resolve the
//! video's current URL, relay the delegate's output into the object store and
//! overwrite `video_url` with the new location.

use axum::extract::State;
use axum::Json;
use clipstudio_cloud::UploadOptions;
use clipstudio_core::delegate::DelegateRequest;
use clipstudio_core::error::CoreError;
use clipstudio_core::types::DbId;
use clipstudio_db::models::video::Video;
use clipstudio_db::repositories::VideoRepo;
use serde::Serialize;
use serde_json::Value;

use super::params::{flag, optional_value, require_id, require_value};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::pipeline::relay::relay;
use crate::state::AppState;

/// Frame index sent for click removal when the client omits one.
const DEFAULT_FRAME: &str = "0";

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub success: bool,
    pub video: Video,
}

/// POST /video/auto-removal
pub async fn auto_removal(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<MediaResponse>> {
    let video_id = video_id(&body)?;
    process(&state, &auth, video_id, |video_url| {
        DelegateRequest::AutoRemoval { video_url }
    })
    .await
}

/// POST /video/click-removal
pub async fn click_removal(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<MediaResponse>> {
    let video_id = video_id(&body)?;
    let x = require_value(&body, "x_coord", "Missing x_coord")?;
    let y = require_value(&body, "y_coord", "Missing y_coord")?;
    let frame = optional_value(&body, "frame").unwrap_or_else(|| DEFAULT_FRAME.to_string());

    process(&state, &auth, video_id, |video_url| {
        DelegateRequest::ClickRemoval {
            video_url,
            x,
            y,
            frame,
        }
    })
    .await
}

/// POST /video/denoise
pub async fn denoise(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<MediaResponse>> {
    let video_id = video_id(&body)?;
    let volume = optional_value(&body, "volume");
    let generate_subtitles = flag(&body, "gen_sub");

    process(&state, &auth, video_id, |video_url| DelegateRequest::Denoise {
        video_url,
        volume,
        generate_subtitles,
    })
    .await
}

/// POST /video/stylize
pub async fn stylize(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<MediaResponse>> {
    let video_id = video_id(&body)?;
    let style = require_id(&body, "style_id", "Missing style_id")?;

    process(&state, &auth, video_id, |video_url| DelegateRequest::Stylize {
        video_url,
        style,
    })
    .await
}

/// POST /video/superres
pub async fn superres(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<MediaResponse>> {
    let video_id = video_id(&body)?;
    process(&state, &auth, video_id, |video_url| {
        DelegateRequest::SuperResolution { video_url }
    })
    .await
}

/// POST /video/bgchange
pub async fn bgchange(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<MediaResponse>> {
    let video_id = video_id(&body)?;
    let background = require_id(&body, "bg_num", "Missing bg_num")?;

    process(&state, &auth, video_id, |video_url| {
        DelegateRequest::BackgroundChange {
            video_url,
            background,
        }
    })
    .await
}

fn video_id(body: &Value) -> Result<DbId, AppError> {
    require_id(body, "video_id", "Missing video_id")
}

/// Resolve the video, relay `build(source_url)` and store the result URL.
async fn process<F>(
    state: &AppState,
    auth: &AuthUser,
    video_id: DbId,
    build: F,
) -> AppResult<Json<MediaResponse>>
where
    F: FnOnce(String) -> DelegateRequest,
{
    let video = VideoRepo::find_by_id(&state.pool, video_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;
    if video.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden("Access denied".into())));
    }
    let source = video.source_url().ok_or(AppError::Core(CoreError::NotFound {
        entity: "VideoSource",
        id: video_id,
    }))?;

    let request = build(source.to_string());
    let options = UploadOptions::video_for_user(auth.user_id, video.video_name.clone());
    tracing::info!(video_id, kind = %request.kind(), "Processing video");

    let pool = state.pool.clone();
    let updated = relay(
        &state.delegates,
        state.object_store.as_ref(),
        &request,
        &options,
        move |stored| async move {
            VideoRepo::update_url(&pool, video_id, &stored.secure_url)
                .await?
                .ok_or(sqlx::Error::RowNotFound)
        },
    )
    .await?;

    tracing::info!(video_id, url = ?updated.video_url, "Video processed");
    Ok(Json(MediaResponse {
        success: true,
        video: updated,
    }))
}
