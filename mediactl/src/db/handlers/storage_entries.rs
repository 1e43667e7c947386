//! Database repository for storage entries.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::storage_entries::{StorageEntry, StorageEntryCreateDBRequest, StorageEntryDBResponse, StorageEntryFilter},
    },
    types::StorageEntryId,
};

const COLUMNS: &str = "id, generated_name, uri, created_at";

pub struct StorageEntries<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for StorageEntries<'c> {
    type CreateRequest = StorageEntryCreateDBRequest;
    type Response = StorageEntryDBResponse;
    type Id = StorageEntryId;
    type Filter = StorageEntryFilter;

    #[instrument(skip(self, request), fields(generated_name = %request.generated_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let entry = sqlx::query_as::<_, StorageEntry>(&format!(
            "INSERT INTO storage_entries (generated_name, uri) VALUES ($1, $2) RETURNING {COLUMNS}"
        ))
        .bind(&request.generated_name)
        .bind(&request.uri)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let entry = sqlx::query_as::<_, StorageEntry>(&format!("SELECT {COLUMNS} FROM storage_entries WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(entry)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let entries = sqlx::query_as::<_, StorageEntry>(&format!(
            "SELECT {COLUMNS} FROM storage_entries ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM storage_entries WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> StorageEntries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up an entry by its generated blob name
    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, generated_name: &str) -> Result<Option<StorageEntry>> {
        let entry = sqlx::query_as::<_, StorageEntry>(&format!("SELECT {COLUMNS} FROM storage_entries WHERE generated_name = $1"))
            .bind(generated_name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(entry)
    }

    /// Number of entries using a generated name; zero means the name is free
    #[instrument(skip(self), err)]
    pub async fn count_by_name(&mut self, generated_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storage_entries WHERE generated_name = $1")
            .bind(generated_name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn create_request(name: &str) -> StorageEntryCreateDBRequest {
        StorageEntryCreateDBRequest {
            generated_name: name.to_string(),
            uri: format!("https://blobs.example.com/images/{name}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_lookup_by_name(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = StorageEntries::new(&mut conn);

        let created = repo.create(&create_request("abc.png")).await.unwrap();
        assert_eq!(created.generated_name, "abc.png");

        let found = repo.get_by_name("abc.png").await.unwrap().expect("entry should exist");
        assert_eq!(found.id, created.id);
        assert_eq!(found.uri, "https://blobs.example.com/images/abc.png");

        assert!(repo.get_by_name("missing.png").await.unwrap().is_none());
        assert_eq!(repo.count_by_name("abc.png").await.unwrap(), 1);
        assert_eq!(repo.count_by_name("missing.png").await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = StorageEntries::new(&mut conn);

        repo.create(&create_request("dup.jpg")).await.unwrap();
        let err = repo.create(&create_request("dup.jpg")).await.unwrap_err();

        match err {
            DbError::UniqueViolation {
                table, conflicting_value, ..
            } => {
                assert_eq!(table.as_deref(), Some("storage_entries"));
                assert_eq!(conflicting_value.as_deref(), Some("dup.jpg"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_delete(pool: PgPool) {
        let mut tx = pool.begin().await.unwrap();
        let mut repo = StorageEntries::new(&mut tx);

        let a = repo.create(&create_request("a.png")).await.unwrap();
        let b = repo.create(&create_request("b.png")).await.unwrap();

        let listed = repo.list(&StorageEntryFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 2);
        // Newest first
        assert_eq!(listed[0].id, b.id);

        let page = repo.list(&StorageEntryFilter { skip: 1, limit: Some(1) }).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, a.id);

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert!(repo.get_by_id(a.id).await.unwrap().is_none());

        tx.commit().await.unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_default_list_returns_every_row(pool: PgPool) {
        sqlx::query(
            "INSERT INTO storage_entries (generated_name, uri) \
             SELECT 'bulk' || n || '.png', 'https://blobs.example.com/images/bulk' || n || '.png' \
             FROM generate_series(1, 1005) AS n",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let listed = StorageEntries::new(&mut conn).list(&StorageEntryFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1005);
    }
}
