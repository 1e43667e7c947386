//! Database models for storage entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::StorageEntryId;

/// Database entity model
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StorageEntry {
    pub id: StorageEntryId,
    pub generated_name: String,
    pub uri: String,
    pub created_at: DateTime<Utc>,
}

/// Request for creating a storage entry
#[derive(Debug, Clone)]
pub struct StorageEntryCreateDBRequest {
    pub generated_name: String,
    pub uri: String,
}

/// Response type (same as entity for now)
pub type StorageEntryDBResponse = StorageEntry;

/// Filter for listing storage entries.
///
/// The pages show every row, so the default has no limit.
#[derive(Debug, Clone, Default)]
pub struct StorageEntryFilter {
    pub skip: i64,
    /// `None` returns every row after `skip`
    pub limit: Option<i64>,
}
