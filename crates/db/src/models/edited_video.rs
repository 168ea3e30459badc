//! Edited video entity model and DTOs.

use clipstudio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `edited_videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedVideo {
    pub id: DbId,
    pub project_id: DbId,
    pub video_id: Option<DbId>,
    pub edited_url: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEditedVideo {
    pub project_id: DbId,
    pub video_id: Option<DbId>,
    pub edited_url: String,
}
