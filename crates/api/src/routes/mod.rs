pub mod gif;
pub mod health;
pub mod user;
pub mod video;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree, mounted at the root.
///
/// Route hierarchy:
///
/// ```text
/// /user/signup                         signup (public)
/// /user/login                          login (public)
/// /user/profile                        profile (requires auth)
/// /user/modifyUser                     profile edit (requires auth)
///
/// /video/new-project                   create project
/// /video/upload                        multipart upload
/// /video/edited-upload                 multipart upload of an edited render
/// /video/auto-removal                  ML: automatic object removal
/// /video/click-removal                 ML: click-based object removal
/// /video/denoise                       ML: audio denoise
/// /video/stylize                       ML: style transfer
/// /video/superres                      ML: super-resolution
/// /video/bgchange                      ML: background change
/// /video/export                        timeline concat (public)
///
/// /gif/generate                        ML: prompt to clip
/// /gif/export                          single-clip re-encode (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/user", user::router())
        .nest("/video", video::router())
        .nest("/gif", gif::router())
}
