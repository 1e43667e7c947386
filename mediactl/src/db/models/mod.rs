//! Database record models matching table schemas.
//!
//! Models derive `sqlx::FromRow` for query results and `serde::Serialize` so the views can render
//! them directly.
//!
//! - [`storage_entries`]: images uploaded through the storage pages
//! - [`team_members`]: team member profiles

pub mod storage_entries;
pub mod team_members;
