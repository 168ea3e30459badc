//! Route definitions for the `/user` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/user`.
///
/// ```text
/// POST /signup      -> signup
/// POST /login       -> login
/// GET  /profile     -> profile
/// PUT  /modifyUser  -> modify_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(user::signup))
        .route("/login", post(user::login))
        .route("/profile", get(user::profile))
        .route("/modifyUser", put(user::modify_user))
}
