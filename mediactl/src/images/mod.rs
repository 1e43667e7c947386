//! Image upload and delete orchestration.
//!
//! Both the storage pages and the team pages follow the same sequence: validate the declared
//! content type against the configured allow-list, generate a random name no existing row uses,
//! write the blob, resolve its public URI from the blob listing, and write the metadata row.
//! Deletes remove the metadata row first and the blob second.
//!
//! Blob storage and the metadata store are not updated atomically. A failure between the two
//! steps leaves either an orphaned blob or a row pointing at a missing blob; nothing here
//! compensates for that.

pub mod names;
pub mod service;
pub mod store;
pub mod validation;

pub use names::{NameGenerator, RandomNameGenerator, replace_extension};
pub use service::{ImageService, UploadFile};
#[cfg(test)]
pub use store::InMemoryMetadataStore;
pub use store::{MetadataStore, PgMetadataStore};
pub use validation::{ValidationError, validate_content_type, validate_profile};
