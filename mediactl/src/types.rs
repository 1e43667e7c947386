//! Common type definitions.
//!
//! Rows in both metadata tables are keyed by `BIGSERIAL` surrogate ids; generated file names are
//! the natural key used by the storage pages and by blob storage.

use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for IDs
pub type StorageEntryId = i64;
pub type TeamMemberId = i64;

/// The two kinds of metadata rows that own a blob.
///
/// Generated names are checked for uniqueness against the table of the kind being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    StorageEntry,
    TeamMember,
}

impl ImageKind {
    /// Table holding the rows of this kind
    pub fn table(&self) -> &'static str {
        match self {
            ImageKind::StorageEntry => "storage_entries",
            ImageKind::TeamMember => "team_members",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::StorageEntry => write!(f, "Storage entry"),
            ImageKind::TeamMember => write!(f, "Team member"),
        }
    }
}
