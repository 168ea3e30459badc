//! Generated GIF entity model and DTOs.

use clipstudio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `gifs` table. `video_name` holds the generation prompt.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gif {
    pub id: DbId,
    pub user_id: DbId,
    pub video_url: String,
    pub video_name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGif {
    pub user_id: DbId,
    pub video_url: String,
    pub video_name: String,
}
