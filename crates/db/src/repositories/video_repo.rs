//! Repository for the `videos` table.

use clipstudio_core::types::DbId;
use sqlx::PgPool;

use crate::models::video::{CreateVideo, Video};

const COLUMNS: &str = "id, project_id, user_id, video_url, video_name, created_at, updated_at";

/// Provides CRUD operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new video, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (project_id, user_id, video_url, video_name)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(input.project_id)
            .bind(input.user_id)
            .bind(&input.video_url)
            .bind(&input.video_name)
            .fetch_one(pool)
            .await
    }

    /// Find a video by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the media URL of a video in place.
    ///
    /// Concurrent updates are not serialized; the last write wins.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_url(
        pool: &PgPool,
        id: DbId,
        video_url: &str,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET video_url = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(video_url)
            .fetch_optional(pool)
            .await
    }
}
