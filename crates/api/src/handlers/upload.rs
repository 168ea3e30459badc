//! Handlers for client file uploads (`/video/upload`, `/video/edited-upload`).
//!
//! Both take `multipart/form-data` and stream the first file part straight to
//! the object store before recording its URL.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::Json;
use clipstudio_core::error::CoreError;
use clipstudio_core::types::DbId;
use clipstudio_db::models::edited_video::{CreateEditedVideo, EditedVideo};
use clipstudio_db::models::project::Project;
use clipstudio_db::models::video::{CreateVideo, Video};
use clipstudio_db::repositories::{EditedVideoRepo, ProjectRepo, VideoRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::pipeline::ingest::ingest_first_file;
use crate::state::AppState;

/// Query string for both upload routes. Ids are parsed by hand so a
/// malformed value yields the same 400 as a missing one.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub project_id: Option<String>,
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub video: Video,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedUploadResponse {
    pub success: bool,
    pub edited_video: EditedVideo,
}

/// POST /video/upload?project_id=
pub async fn upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let project = owned_project(&state, &auth, query.project_id.as_deref()).await?;

    let ingested =
        ingest_first_file(&mut multipart, Arc::clone(&state.object_store), auth.user_id).await?;
    let url = ingested.stored.secure_url;

    let video = VideoRepo::create(
        &state.pool,
        &CreateVideo {
            project_id: project.id,
            user_id: auth.user_id,
            video_url: Some(url.clone()),
            video_name: ingested.file_name,
        },
    )
    .await
    .map_err(|source| AppError::Persistence { url, source })?;

    tracing::info!(video_id = video.id, project_id = project.id, "Video uploaded");
    Ok(Json(UploadResponse {
        success: true,
        video,
    }))
}

/// POST /video/edited-upload?project_id=&video_id=
///
/// `video_id` is optional; when given it must name an existing video of the
/// caller.
pub async fn edited_upload(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<EditedUploadResponse>> {
    let project = owned_project(&state, &auth, query.project_id.as_deref()).await?;

    let video_id = match query.video_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let id: DbId = raw
                .parse()
                .map_err(|_| AppError::BadRequest("Invalid video_id".into()))?;
            let video = VideoRepo::find_by_id(&state.pool, id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "Video",
                    id,
                }))?;
            if video.user_id != auth.user_id {
                return Err(AppError::Core(CoreError::Forbidden("Access denied".into())));
            }
            Some(video.id)
        }
    };

    let ingested =
        ingest_first_file(&mut multipart, Arc::clone(&state.object_store), auth.user_id).await?;
    let url = ingested.stored.secure_url;

    let edited_video = EditedVideoRepo::create(
        &state.pool,
        &CreateEditedVideo {
            project_id: project.id,
            video_id,
            edited_url: url.clone(),
        },
    )
    .await
    .map_err(|source| AppError::Persistence { url, source })?;

    tracing::info!(
        edited_video_id = edited_video.id,
        project_id = project.id,
        ?video_id,
        "Edited video uploaded"
    );
    Ok(Json(EditedUploadResponse {
        success: true,
        edited_video,
    }))
}

/// Resolve `project_id` to a project the caller owns.
async fn owned_project(
    state: &AppState,
    auth: &AuthUser,
    project_id: Option<&str>,
) -> AppResult<Project> {
    let id: DbId = project_id
        .and_then(|raw| raw.trim().parse().ok())
        .ok_or_else(|| AppError::BadRequest("Missing user_id or project_id".into()))?;

    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    if project.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden("Access denied".into())));
    }
    Ok(project)
}
