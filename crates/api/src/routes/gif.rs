//! Route definitions for the `/gif` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::gif;
use crate::state::AppState;

/// Routes mounted at `/gif`.
///
/// ```text
/// POST /generate  -> generate
/// POST /export    -> export
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(gif::generate))
        .route("/export", post(gif::export))
}
