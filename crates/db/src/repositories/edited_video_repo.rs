//! Repository for the `edited_videos` table.

use clipstudio_core::types::DbId;
use sqlx::PgPool;

use crate::models::edited_video::{CreateEditedVideo, EditedVideo};

const COLUMNS: &str = "id, project_id, video_id, edited_url, created_at";

pub struct EditedVideoRepo;

impl EditedVideoRepo {
    /// Insert a new edited video, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateEditedVideo,
    ) -> Result<EditedVideo, sqlx::Error> {
        let query = format!(
            "INSERT INTO edited_videos (project_id, video_id, edited_url)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EditedVideo>(&query)
            .bind(input.project_id)
            .bind(input.video_id)
            .bind(&input.edited_url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EditedVideo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM edited_videos WHERE id = $1");
        sqlx::query_as::<_, EditedVideo>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
