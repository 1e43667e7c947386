//! Blob storage for uploaded image bytes.
//!
//! The upload flow only needs three primitives from a backend: put an object under a name, delete
//! it, and list everything with its public URI. There is no lookup-by-name; callers that need the
//! URI of a fresh upload scan [`BlobStorage::list`].
//!
//! Backends:
//! - [`S3BlobStorage`]: any S3-compatible object store
//! - [`LocalBlobStorage`]: a directory on disk, served by the application under `/blobs`
//! - [`InMemoryBlobStorage`]: process memory, for tests and offline development

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::config::BlobStorageConfig;

pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalBlobStorage;
#[cfg(test)]
pub use memory::BlobOperation;
pub use memory::InMemoryBlobStorage;
pub use s3::S3BlobStorage;

/// An object as reported by a backend listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobObject {
    pub name: String,
    pub uri: String,
}

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob {name} not found")]
    NotFound { name: String },

    /// Names are generated by the service; anything that could escape a directory is refused
    #[error("Invalid blob name: {name}")]
    InvalidName { name: String },

    /// Failure reported by the backend, carrying its status text
    #[error("{status}")]
    Backend { status: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BlobError {
    /// Plain-text status suitable for showing to the client
    pub fn status(&self) -> String {
        match self {
            BlobError::NotFound { .. } => "The specified blob does not exist.".to_string(),
            BlobError::InvalidName { name } => format!("Invalid blob name: {name}"),
            BlobError::Backend { status } => status.clone(),
            BlobError::Io(e) => format!("Blob storage I/O error: {}", e.kind()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BlobError>;

/// Trait for blob storage backends
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `content` under `name`, replacing any existing object
    async fn upload(&self, name: &str, content_type: &str, content: Bytes) -> Result<()>;

    /// Remove the object stored under `name`
    async fn delete(&self, name: &str) -> Result<()>;

    /// All stored objects with their public URIs
    async fn list(&self) -> Result<Vec<BlobObject>>;
}

/// Normalise a public base URL so object names can be appended to it
pub(crate) fn base_uri(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

/// Names are flat; path separators and parent references are never valid
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(BlobError::InvalidName { name: name.to_string() });
    }
    Ok(())
}

/// Build the blob storage backend selected in the configuration
pub async fn create_blob_storage(config: &BlobStorageConfig) -> anyhow::Result<Arc<dyn BlobStorage>> {
    match config {
        BlobStorageConfig::S3 { .. } => {
            let storage = S3BlobStorage::from_config(config).await?;
            tracing::info!("Using S3 blob storage");
            Ok(Arc::new(storage))
        }
        BlobStorageConfig::Local { path, public_base_url } => {
            let storage = LocalBlobStorage::new(path.clone(), public_base_url.as_str()).await?;
            tracing::info!("Using local blob storage at {}", path.display());
            Ok(Arc::new(storage))
        }
        BlobStorageConfig::Memory { public_base_url } => {
            tracing::warn!("Using in-memory blob storage; uploaded images are lost on restart");
            Ok(Arc::new(InMemoryBlobStorage::new(public_base_url.as_str())))
        }
    }
}
