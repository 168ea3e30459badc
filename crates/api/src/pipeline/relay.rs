//! Delegate-and-relay: ML endpoint -> object store -> database.

use std::future::Future;

use clipstudio_cloud::{DelegateClient, ObjectStore, StoredObject, UploadOptions};
use clipstudio_core::delegate::DelegateRequest;

use crate::error::{AppError, AppResult};

/// Run one processing job end to end.
///
/// Exactly one delegate call and at most one upload are made. The delegate's
/// body is streamed straight into the store and the upload's outcome is the
/// single resolution of its future. `persist` runs at most once, only after
/// the upload succeeded, and its failure is reported as
/// [`AppError::Persistence`] carrying the now orphaned URL.
pub async fn relay<T, F, Fut>(
    delegates: &DelegateClient,
    store: &dyn ObjectStore,
    request: &DelegateRequest,
    options: &UploadOptions,
    persist: F,
) -> AppResult<T>
where
    F: FnOnce(StoredObject) -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let kind = request.kind();
    let body = delegates.call(request).await?;

    let stored = store.upload(body, options).await?;

    let url = stored.secure_url.clone();
    tracing::debug!(%kind, %url, "Relayed delegate output to object store");

    persist(stored)
        .await
        .map_err(|source| AppError::Persistence { url, source })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use axum::routing::post;
    use axum::{Form, Router};
    use clipstudio_cloud::DelegateEndpoints;

    use super::*;
    use crate::pipeline::testing::MemoryStore;

    type Fields = Arc<Mutex<Vec<(String, String)>>>;

    async fn ml_stub(fields: Fields) -> DelegateClient {
        ml_stub_counting(fields, Arc::default()).await
    }

    async fn ml_stub_counting(fields: Fields, hits: Arc<AtomicUsize>) -> DelegateClient {
        let app = Router::new()
            .route(
                "/denoise",
                post(move |Form(form): Form<Vec<(String, String)>>| {
                    let fields = fields.clone();
                    async move {
                        *fields.lock().unwrap() = form;
                        "clean-audio-video"
                    }
                }),
            )
            .route(
                "/run",
                post(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "upscaled-video"
                    }
                }),
            )
            .route(
                "/process",
                post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        DelegateClient::new(DelegateEndpoints::with_base(&format!("http://{addr}")))
    }

    async fn never_persist(_: StoredObject) -> Result<(), sqlx::Error> {
        panic!("persist must not run")
    }

    fn denoise() -> DelegateRequest {
        DelegateRequest::Denoise {
            video_url: "https://store/a.mp4".into(),
            volume: Some("80".into()),
            generate_subtitles: true,
        }
    }

    #[tokio::test]
    async fn denoise_relays_result_and_persists_new_url() {
        let fields = Fields::default();
        let delegates = ml_stub(fields.clone()).await;
        let store = MemoryStore::default();
        let options = UploadOptions::video_for_user(7, "denoise.mp4");

        let persisted = relay(&delegates, &store, &denoise(), &options, |stored| async move {
            Ok::<_, sqlx::Error>(stored.secure_url)
        })
        .await
        .unwrap();

        assert_eq!(persisted, "https://store.test/user7/denoise.mp4");
        assert_eq!(
            *fields.lock().unwrap(),
            vec![
                ("video_url".to_string(), "https://store/a.mp4".to_string()),
                ("volume".to_string(), "80".to_string()),
                ("gen_sub".to_string(), "true".to_string()),
            ]
        );
        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0.folder, "user7");
        assert_eq!(uploads[0].1, b"clean-audio-video");
    }

    #[tokio::test]
    async fn each_step_runs_exactly_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let delegates = ml_stub_counting(Fields::default(), hits.clone()).await;
        let store = MemoryStore::default();
        let persisted = Arc::new(AtomicUsize::new(0));
        let request = DelegateRequest::SuperResolution {
            video_url: "https://store/a.mp4".into(),
        };

        let counter = persisted.clone();
        relay(
            &delegates,
            &store,
            &request,
            &UploadOptions::video_for_user(2, "superres.mp4"),
            move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, sqlx::Error>(())
            },
        )
        .await
        .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(persisted.load(Ordering::SeqCst), 1);
        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, b"upscaled-video");
    }

    #[tokio::test]
    async fn upstream_failure_skips_upload_and_persist() {
        let delegates = ml_stub(Fields::default()).await;
        let store = MemoryStore::default();
        let request = DelegateRequest::AutoRemoval {
            video_url: "https://store/a.mp4".into(),
        };

        let result = relay(
            &delegates,
            &store,
            &request,
            &UploadOptions::video_for_user(1, "x.mp4"),
            never_persist,
        )
        .await;

        assert_matches!(result, Err(AppError::Upstream(_)));
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_not_persisted() {
        let delegates = ml_stub(Fields::default()).await;
        let store = MemoryStore::rejecting();

        let result = relay(
            &delegates,
            &store,
            &denoise(),
            &UploadOptions::video_for_user(1, "x.mp4"),
            never_persist,
        )
        .await;

        assert_matches!(result, Err(AppError::Storage(_)));
    }

    #[tokio::test]
    async fn persistence_failure_keeps_orphaned_url() {
        let delegates = ml_stub(Fields::default()).await;
        let store = MemoryStore::default();

        let result: AppResult<()> = relay(
            &delegates,
            &store,
            &denoise(),
            &UploadOptions::video_for_user(3, "denoise.mp4"),
            |_| async { Err(sqlx::Error::RowNotFound) },
        )
        .await;

        assert_matches!(
            result,
            Err(AppError::Persistence { ref url, .. }) if url == "https://store.test/user3/denoise.mp4"
        );
        assert_eq!(store.uploads.lock().unwrap().len(), 1);
    }
}
