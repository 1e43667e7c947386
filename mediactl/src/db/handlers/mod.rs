//! Repository implementations for database access.
//!
//! # Available Repositories
//!
//! - [`StorageEntries`]: images uploaded through the storage pages
//! - [`TeamMembers`]: team member profiles and their photo
//!
//! Both follow the [`Repository`] trait and add lookups by generated name, which is how the
//! upload flow checks a freshly generated name for collisions.

pub mod repository;
pub mod storage_entries;
pub mod team_members;

pub use repository::Repository;
pub use storage_entries::StorageEntries;
pub use team_members::TeamMembers;
