//! Media pipelines behind the HTTP handlers.
//!
//! - [`relay`] -- delegate a processing job to an ML endpoint and stream the
//!   result into the object store.
//! - [`ingest`] -- stream the first file of a multipart upload into the
//!   object store.
//! - [`export`] -- download clips, run the local encoder and stream the
//!   result back, owning the scratch directory until the body is done.

pub mod export;
pub mod ingest;
pub mod relay;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use clipstudio_cloud::{ByteStream, ObjectStore, StorageError, StoredObject, UploadOptions};
    use futures::StreamExt;

    /// In-memory object store recording every upload.
    #[derive(Default)]
    pub struct MemoryStore {
        pub uploads: Mutex<Vec<(UploadOptions, Vec<u8>)>>,
        reject: bool,
    }

    impl MemoryStore {
        /// A store that drains the body and then refuses it.
        pub fn rejecting() -> Self {
            Self {
                reject: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn upload(
            &self,
            mut body: ByteStream,
            options: &UploadOptions,
        ) -> Result<StoredObject, StorageError> {
            let mut bytes = Vec::new();
            while let Some(chunk) = body.next().await {
                bytes.extend_from_slice(&chunk.expect("body chunk"));
            }
            if self.reject {
                return Err(StorageError::Api {
                    status: 400,
                    body: "rejected".into(),
                });
            }
            self.uploads.lock().unwrap().push((options.clone(), bytes));
            Ok(StoredObject {
                secure_url: format!("https://store.test/{}/{}", options.folder, options.file_name),
                public_id: options.file_name.clone(),
                bytes: None,
            })
        }
    }
}
