//! Video entity model and DTOs.

use clipstudio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A video row from the `videos` table.
///
/// `video_url` always points at the most recently accepted media; processing
/// operations overwrite it in place.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub video_url: Option<String>,
    pub video_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Video {
    /// The current media URL, treating an empty string like a missing one.
    pub fn source_url(&self) -> Option<&str> {
        self.video_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// DTO for creating a new video.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideo {
    pub project_id: DbId,
    pub user_id: DbId,
    pub video_url: Option<String>,
    pub video_name: String,
}
