//! Handler for `POST /video/new-project`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use clipstudio_db::models::project::{CreateProject, Project};
use clipstudio_db::repositories::ProjectRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewProjectRequest {
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewProjectResponse {
    pub success: bool,
    pub message: &'static str,
    pub project: Project,
}

/// POST /video/new-project
///
/// Creates a project owned by the caller. Uploads are filed under it.
pub async fn new_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewProjectRequest>,
) -> AppResult<(StatusCode, Json<NewProjectResponse>)> {
    let name = input
        .project_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing user_id or project_name".into()))?;

    let project = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            user_id: auth.user_id,
            name,
        },
    )
    .await?;

    tracing::info!(user_id = auth.user_id, project_id = project.id, "Project created");
    Ok((
        StatusCode::CREATED,
        Json(NewProjectResponse {
            success: true,
            message: "Project created successfully",
            project,
        }),
    ))
}
