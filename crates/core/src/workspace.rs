//! Per-request scratch directories for export jobs.
//!
//! Every export gets its own `export-<uuid>` directory under a configured
//! root. The directory is removed on every exit path: explicitly via
//! [`ExportWorkspace::cleanup`] when a step fails, or after a grace delay
//! once the guard is dropped (typically when the response body has been
//! fully streamed or the client disconnected).

use std::path::{Path, PathBuf};
use std::time::Duration;

/// RAII guard owning an export scratch directory.
#[derive(Debug)]
pub struct ExportWorkspace {
    dir: PathBuf,
    grace: Duration,
    removed: bool,
}

impl ExportWorkspace {
    /// Create a fresh, uniquely named directory under `root`.
    pub async fn create(root: &Path, grace: Duration) -> std::io::Result<Self> {
        let dir = root.join(format!("export-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Created export workspace");
        Ok(Self {
            dir,
            grace,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of `name` inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Remove the directory now. Errors are logged, not returned.
    pub async fn cleanup(mut self) {
        self.removed = true;
        remove_logged(&self.dir).await;
    }
}

impl Drop for ExportWorkspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let dir = std::mem::take(&mut self.dir);
        let grace = self.grace;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    remove_logged(&dir).await;
                });
            }
            Err(_) => {
                if let Err(e) = std::fs::remove_dir_all(&dir) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove export workspace");
                    }
                }
            }
        }
    }
}

async fn remove_logged(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => tracing::debug!(dir = %dir.display(), "Removed export workspace"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove export workspace")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_unique_directories() {
        let root = tempfile::tempdir().unwrap();
        let a = ExportWorkspace::create(root.path(), Duration::ZERO).await.unwrap();
        let b = ExportWorkspace::create(root.path(), Duration::ZERO).await.unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        let name = a.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("export-"));
        assert_eq!(a.file("concat.txt"), a.path().join("concat.txt"));
    }

    #[tokio::test]
    async fn cleanup_removes_immediately() {
        let root = tempfile::tempdir().unwrap();
        let ws = ExportWorkspace::create(root.path(), Duration::from_secs(60))
            .await
            .unwrap();
        let dir = ws.path().to_path_buf();
        tokio::fs::write(ws.file("clip0.mp4"), b"data").await.unwrap();

        ws.cleanup().await;
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn drop_removes_after_grace() {
        let root = tempfile::tempdir().unwrap();
        let ws = ExportWorkspace::create(root.path(), Duration::from_millis(50))
            .await
            .unwrap();
        let dir = ws.path().to_path_buf();

        drop(ws);
        assert!(dir.exists(), "removal waits for the grace period");

        for _ in 0..50 {
            if !dir.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("workspace was not removed after the grace period");
    }

    #[test]
    fn drop_outside_runtime_removes_synchronously() {
        let root = tempfile::tempdir().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let ws = rt
            .block_on(ExportWorkspace::create(root.path(), Duration::from_secs(60)))
            .unwrap();
        let dir = ws.path().to_path_buf();
        drop(rt);

        drop(ws);
        assert!(!dir.exists());
    }
}
