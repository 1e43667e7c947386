use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{BlobError, BlobObject, BlobStorage, Result, base_uri, check_name};

/// Local filesystem storage backend - one file per blob in a flat directory.
/// Useful for development; the directory is served under `/blobs`.
pub struct LocalBlobStorage {
    base_path: PathBuf,
    public_base: String,
}

impl LocalBlobStorage {
    /// Create the backend, making sure the directory exists
    pub async fn new(base_path: PathBuf, public_base_url: &str) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            public_base: base_uri(public_base_url),
        })
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn upload(&self, name: &str, _content_type: &str, content: Bytes) -> Result<()> {
        check_name(name)?;
        let full_path = self.base_path.join(name);

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        match fs::remove_file(self.base_path.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BlobError::NotFound { name: name.to_string() }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<BlobObject>> {
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut objects = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            // Non UTF-8 names can't have been written by us
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            objects.push(BlobObject {
                uri: format!("{}{}", self.public_base, name),
                name,
            });
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(dir.path().to_path_buf(), "http://localhost:3001/blobs")
            .await
            .unwrap();

        storage.upload("b.png", "image/png", Bytes::from_static(b"bbb")).await.unwrap();
        storage.upload("a.jpg", "image/jpeg", Bytes::from_static(b"aaa")).await.unwrap();

        let on_disk = std::fs::read(dir.path().join("b.png")).unwrap();
        assert_eq!(on_disk, b"bbb");

        let listed = storage.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "a.jpg");
        assert_eq!(listed[0].uri, "http://localhost:3001/blobs/a.jpg");

        storage.delete("a.jpg").await.unwrap();
        let listed = storage.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "b.png");
    }

    #[tokio::test]
    async fn test_delete_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(dir.path().to_path_buf(), "http://localhost/blobs/").await.unwrap();

        let err = storage.delete("missing.png").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_listing_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();
        let storage = LocalBlobStorage::new(dir.path().to_path_buf(), "http://localhost/blobs/").await.unwrap();

        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(dir.path().join("blobs"), "http://localhost/blobs/").await.unwrap();

        let err = storage
            .upload("../escape.png", "image/png", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::InvalidName { .. }));
        assert!(!dir.path().join("escape.png").exists());
    }
}
