//! HTTP clients for the services the backend delegates to: the media object
//! store, the ML processing endpoints and plain remote downloads.

pub mod delegate;
pub mod download;
pub mod object_store;

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

pub use delegate::{DelegateClient, DelegateEndpoints, DelegateError};
pub use download::{DownloadError, Downloader};
pub use object_store::{
    CloudinaryConfig, CloudinaryStore, ObjectStore, StorageError, StoredObject, UploadOptions,
};

/// A boxed, sendable stream of byte chunks, as relayed between services.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;
