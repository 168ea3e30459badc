//! Repository for the `gifs` table.

use clipstudio_core::types::DbId;
use sqlx::PgPool;

use crate::models::gif::{CreateGif, Gif};

const COLUMNS: &str = "id, user_id, video_url, video_name, created_at";

pub struct GifRepo;

impl GifRepo {
    /// Insert a generated GIF, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateGif) -> Result<Gif, sqlx::Error> {
        let query = format!(
            "INSERT INTO gifs (user_id, video_url, video_name)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Gif>(&query)
            .bind(input.user_id)
            .bind(&input.video_url)
            .bind(&input.video_name)
            .fetch_one(pool)
            .await
    }

    /// List a user's GIFs, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Gif>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM gifs WHERE user_id = $1 ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Gif>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
