//! Route definitions for the `/video` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::{export, media, project, upload};
use crate::state::AppState;

/// Routes mounted at `/video`.
///
/// ```text
/// POST /new-project     -> project::new_project
/// POST /upload          -> upload::upload
/// POST /edited-upload   -> upload::edited_upload
/// POST /auto-removal    -> media::auto_removal
/// POST /click-removal   -> media::click_removal
/// POST /denoise         -> media::denoise
/// POST /stylize         -> media::stylize
/// POST /superres        -> media::superres
/// POST /bgchange        -> media::bgchange
/// POST /export          -> export::export_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new-project", post(project::new_project))
        .route("/upload", post(upload::upload))
        .route("/edited-upload", post(upload::edited_upload))
        .route("/auto-removal", post(media::auto_removal))
        .route("/click-removal", post(media::click_removal))
        .route("/denoise", post(media::denoise))
        .route("/stylize", post(media::stylize))
        .route("/superres", post(media::superres))
        .route("/bgchange", post(media::bgchange))
        .route("/export", post(export::export_video))
}
