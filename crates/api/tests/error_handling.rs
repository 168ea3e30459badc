//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! database is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use clipstudio_api::error::AppError;
use clipstudio_api::pipeline::export::ExportError;
use clipstudio_cloud::{DelegateError, DownloadError, StorageError};
use clipstudio_core::delegate::DelegateKind;
use clipstudio_core::error::CoreError;
use clipstudio_core::ffmpeg::EncoderError;
use http_body_util::BodyExt;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Video",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Video with id 42 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("Missing video_id".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Missing video_id");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("No video file uploaded".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "No video file uploaded");
}

#[tokio::test]
async fn forbidden_and_unauthorized_map_to_403_and_401() {
    let (status, json) = error_to_response(AppError::Core(CoreError::Forbidden("Access denied".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn upstream_error_surfaces_status_code() {
    let err = AppError::Upstream(DelegateError::Status {
        kind: DelegateKind::Denoise,
        status: 503,
        body: "model offline".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert_eq!(json["error"], "ML processing failed (upstream status 503)");
}

#[tokio::test]
async fn empty_upstream_body_is_an_upstream_error() {
    let err = AppError::Upstream(DelegateError::EmptyBody {
        kind: DelegateKind::Stylize,
    });

    let (_, json) = error_to_response(err).await;

    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert_eq!(json["error"], "ML processing failed");
}

#[tokio::test]
async fn storage_error_is_sanitized() {
    let err = AppError::Storage(StorageError::Api {
        status: 401,
        body: "Invalid signature for api_secret=...".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "STORAGE_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("api_secret"));
}

#[tokio::test]
async fn persistence_error_has_its_own_code() {
    let err = AppError::Persistence {
        url: "https://store.test/user1/a.mp4".into(),
        source: sqlx::Error::RowNotFound,
    };

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PERSISTENCE_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("store.test"));
}

#[tokio::test]
async fn encoder_timeout_is_an_export_failure() {
    let err = AppError::Export(ExportError::Encoder(EncoderError::Timeout(
        std::time::Duration::from_secs(300),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "EXPORT_FAILED");
    assert_eq!(json["error"], "Export timed out");
}

#[tokio::test]
async fn failed_clip_download_is_an_export_failure() {
    let err = AppError::Export(ExportError::Download(DownloadError::Status {
        url: "https://cdn.test/a.mp4".into(),
        status: 404,
    }));

    let (_, json) = error_to_response(err).await;

    assert_eq!(json["code"], "EXPORT_FAILED");
    assert_eq!(json["error"], "Failed to fetch clip");
}

#[tokio::test]
async fn internal_error_hides_details() {
    let err = AppError::InternalError("connection refused to 10.0.0.3".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
