#[cfg(test)]
use std::sync::Mutex;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::{BlobError, BlobObject, BlobStorage, Result, base_uri, check_name};

/// A call made against [`InMemoryBlobStorage`], recorded in order
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobOperation {
    Upload(String),
    Delete(String),
    List,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    content_type: String,
    content: Bytes,
}

/// Switches and the call log used by tests
#[cfg(test)]
#[derive(Default)]
struct TestHooks {
    operations: Mutex<Vec<BlobOperation>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    hide_from_listing: AtomicBool,
}

/// In-memory blob storage.
///
/// Holds only the stored objects. Test builds also record every call, so tests can assert on
/// ordering, and can be told to fail uploads or deletes or to leave objects out of listings.
pub struct InMemoryBlobStorage {
    public_base: String,
    blobs: DashMap<String, StoredBlob>,
    #[cfg(test)]
    hooks: TestHooks,
}

impl InMemoryBlobStorage {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base: base_uri(public_base_url),
            blobs: DashMap::new(),
            #[cfg(test)]
            hooks: TestHooks::default(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blobs.contains_key(name)
    }

    /// Content type and bytes of a stored blob
    pub fn get(&self, name: &str) -> Option<(String, Bytes)> {
        self.blobs.get(name).map(|b| (b.content_type.clone(), b.content.clone()))
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    #[cfg(not(test))]
    fn check_upload(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    #[cfg(not(test))]
    fn check_delete(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    #[cfg(not(test))]
    fn check_list(&self) -> bool {
        true
    }
}

#[cfg(test)]
impl InMemoryBlobStorage {
    fn record(&self, op: BlobOperation) {
        self.hooks.operations.lock().unwrap_or_else(|e| e.into_inner()).push(op);
    }

    fn check_upload(&self, name: &str) -> Result<()> {
        self.record(BlobOperation::Upload(name.to_string()));
        if self.hooks.fail_uploads.load(Ordering::SeqCst) {
            return Err(BlobError::Backend {
                status: "ServiceUnavailable: upload rejected".to_string(),
            });
        }
        Ok(())
    }

    fn check_delete(&self, name: &str) -> Result<()> {
        self.record(BlobOperation::Delete(name.to_string()));
        if self.hooks.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Backend {
                status: "ServiceUnavailable: delete rejected".to_string(),
            });
        }
        Ok(())
    }

    /// Whether listings include stored objects
    fn check_list(&self) -> bool {
        self.record(BlobOperation::List);
        !self.hooks.hide_from_listing.load(Ordering::SeqCst)
    }

    /// Every call made so far, oldest first
    pub fn operations(&self) -> Vec<BlobOperation> {
        self.hooks.operations.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of uploads and deletes made so far; listings are not counted
    pub fn mutation_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| !matches!(op, BlobOperation::List))
            .count()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.hooks.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.hooks.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make listings come back empty while uploads still succeed
    pub fn hide_from_listing(&self, hide: bool) {
        self.hooks.hide_from_listing.store(hide, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn upload(&self, name: &str, content_type: &str, content: Bytes) -> Result<()> {
        self.check_upload(name)?;
        check_name(name)?;
        self.blobs.insert(
            name.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                content,
            },
        );
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.check_delete(name)?;
        match self.blobs.remove(name) {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound { name: name.to_string() }),
        }
    }

    async fn list(&self) -> Result<Vec<BlobObject>> {
        if !self.check_list() {
            return Ok(Vec::new());
        }
        let mut objects: Vec<BlobObject> = self
            .blobs
            .iter()
            .map(|entry| BlobObject {
                name: entry.key().clone(),
                uri: format!("{}{}", self.public_base, entry.key()),
            })
            .collect();
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}
