//! The CRUD surface shared by the image tables.

use crate::db::errors::Result;

/// Data access for one table of image-owning rows.
///
/// Implementations borrow a `&mut PgConnection`, so the caller decides whether calls run inside a
/// transaction:
///
/// ```ignore
/// let mut tx = pool.begin().await?;
/// let removed = StorageEntries::new(&mut tx).delete(entry.id).await?;
/// tx.commit().await?;
/// ```
///
/// Both tables key rows by `BIGSERIAL` ids. Lookups by generated name, and updates for the
/// tables that allow them, are inherent methods on each repository.
#[async_trait::async_trait]
pub trait Repository {
    /// Row fields supplied on insert
    type CreateRequest;
    /// The row as read back
    type Response;
    type Id: Copy + Send + Sync;
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Whether a row was removed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;
}
