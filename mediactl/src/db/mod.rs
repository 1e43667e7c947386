//! Database layer for image metadata.
//!
//! This module implements the data access layer using SQLx with PostgreSQL. It follows the
//! Repository pattern: each table gets a repository in [`handlers`] that wraps a connection or
//! transaction and returns the record types in [`models`].
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Repositories borrow a `&mut PgConnection`, so they work equally on a pooled connection or on a
//! transaction. Writes should go through a transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut repo = StorageEntries::new(&mut tx);
//! let removed = repo.delete(entry.id).await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied at startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
