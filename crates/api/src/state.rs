use std::sync::Arc;

use clipstudio_cloud::{DelegateClient, Downloader, ObjectStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// Every external collaborator is constructed once at startup and injected
/// here, so tests can swap in local doubles.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: clipstudio_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Durable media storage.
    pub object_store: Arc<dyn ObjectStore>,
    /// Client for the ML processing endpoints.
    pub delegates: Arc<DelegateClient>,
    /// Fetches remote clips for local exports.
    pub downloader: Arc<Downloader>,
}
