use std::sync::Arc;

use bytes::Bytes;
use tracing::instrument;

use super::{
    names::{NameGenerator, RandomNameGenerator, replace_extension},
    store::MetadataStore,
    validation::{ValidationError, validate_content_type, validate_profile},
};
use crate::{
    blob::BlobStorage,
    config::Config,
    db::models::{
        storage_entries::{StorageEntry, StorageEntryCreateDBRequest},
        team_members::{TeamMember, TeamMemberCreateDBRequest, TeamMemberProfile, TeamMemberUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{ImageKind, TeamMemberId},
};

/// A file part received from an upload form
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Content type declared by the client, e.g. `image/png`
    pub content_type: String,
    /// Original file name, kept only for logging
    pub file_name: Option<String>,
    pub content: Bytes,
}

/// Drives uploads, edits and deletes across blob storage and the metadata store.
///
/// Every call runs its steps one after another and stops at the first failure. Steps already
/// performed are not rolled back.
#[derive(Clone)]
pub struct ImageService {
    blobs: Arc<dyn BlobStorage>,
    metadata: Arc<dyn MetadataStore>,
    names: Arc<dyn NameGenerator>,
    formats: Arc<[String]>,
    name_length: usize,
    max_name_attempts: usize,
}

impl ImageService {
    pub fn new(config: &Config, blobs: Arc<dyn BlobStorage>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            blobs,
            metadata,
            names: Arc::new(RandomNameGenerator),
            formats: config.formats.images.clone().into(),
            name_length: config.images.name_length,
            max_name_attempts: config.images.max_name_attempts,
        }
    }

    pub fn with_name_generator(mut self, names: Arc<dyn NameGenerator>) -> Self {
        self.names = names;
        self
    }

    /// Accepted image subtypes, for display
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Store an image and record it as a storage entry
    #[instrument(skip(self, file), fields(content_type = %file.content_type, file_name = ?file.file_name, size = file.content.len()), err)]
    pub async fn upload_storage_image(&self, file: UploadFile) -> Result<StorageEntry> {
        let extension = validate_content_type(&file.content_type, &self.formats)?;
        let name = self.generate_unique_name(ImageKind::StorageEntry, &extension).await?;

        let uri = self.store_blob(&name, &extension, file.content).await?;

        let entry = self
            .metadata
            .create_storage_entry(&StorageEntryCreateDBRequest { generated_name: name, uri })
            .await?;

        tracing::info!(generated_name = %entry.generated_name, "Stored image");
        Ok(entry)
    }

    /// Remove a storage entry and its blob.
    ///
    /// The row is deleted and committed first. If the blob delete then fails, the error is
    /// returned and the blob is left orphaned.
    #[instrument(skip(self), err)]
    pub async fn delete_storage_image(&self, name: &str) -> Result<()> {
        let entry = self
            .metadata
            .get_storage_entry_by_name(name)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: ImageKind::StorageEntry.to_string(),
                id: name.to_string(),
            })?;

        if !self.metadata.delete_storage_entry(entry.id).await? {
            // Deleted concurrently; whoever removed the row removes the blob too
            return Err(Error::NotFound {
                resource: ImageKind::StorageEntry.to_string(),
                id: name.to_string(),
            });
        }

        self.delete_blob(&entry.generated_name).await
    }

    pub async fn list_storage_entries(&self) -> Result<Vec<StorageEntry>> {
        Ok(self.metadata.list_storage_entries().await?)
    }

    pub async fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        Ok(self.metadata.list_team_members().await?)
    }

    pub async fn get_team_member(&self, id: TeamMemberId) -> Result<TeamMember> {
        self.metadata.get_team_member(id).await?.ok_or_else(|| team_member_not_found(id))
    }

    /// Create a team member with a mandatory photo
    #[instrument(skip(self, profile, file), fields(has_file = file.is_some()), err)]
    pub async fn create_team_member(&self, profile: TeamMemberProfile, file: Option<UploadFile>) -> Result<TeamMember> {
        let file = file.ok_or(ValidationError::MissingFile)?;
        validate_profile(&profile)?;
        let extension = validate_content_type(&file.content_type, &self.formats)?;
        let name = self.generate_unique_name(ImageKind::TeamMember, &extension).await?;

        let uri = self.store_blob(&name, &extension, file.content).await?;

        let member = self
            .metadata
            .create_team_member(&TeamMemberCreateDBRequest {
                profile,
                generated_name: name,
                uri,
            })
            .await?;

        tracing::info!(id = member.id, generated_name = %member.generated_name, "Created team member");
        Ok(member)
    }

    /// Update a team member's profile, optionally replacing the photo.
    ///
    /// A replacement deletes the old blob, uploads the new one under the old name with the new
    /// extension, and rewrites the stored URI by substituting the name.
    #[instrument(skip(self, profile, file), fields(has_file = file.is_some()), err)]
    pub async fn edit_team_member(&self, id: TeamMemberId, profile: TeamMemberProfile, file: Option<UploadFile>) -> Result<TeamMember> {
        let current = self.get_team_member(id).await?;
        validate_profile(&profile)?;

        let (generated_name, uri) = match file {
            None => (None, None),
            Some(file) => {
                let extension = validate_content_type(&file.content_type, &self.formats)?;

                self.blobs.delete(&current.generated_name).await?;

                let new_name = replace_extension(&current.generated_name, &extension);
                self.blobs
                    .upload(&new_name, &format!("image/{extension}"), file.content)
                    .await?;

                let uri = current.uri.replace(&current.generated_name, &new_name);
                (Some(new_name), Some(uri))
            }
        };

        let member = self
            .metadata
            .update_team_member(
                id,
                &TeamMemberUpdateDBRequest {
                    profile,
                    generated_name,
                    uri,
                },
            )
            .await?;

        Ok(member)
    }

    /// Remove a team member and its photo, row first
    #[instrument(skip(self), err)]
    pub async fn delete_team_member(&self, id: TeamMemberId) -> Result<()> {
        let member = self.get_team_member(id).await?;

        if !self.metadata.delete_team_member(id).await? {
            return Err(team_member_not_found(id));
        }

        self.delete_blob(&member.generated_name).await
    }

    /// Generate names until one is unused by rows of `kind`, giving up after the configured
    /// number of attempts
    async fn generate_unique_name(&self, kind: ImageKind, extension: &str) -> Result<String> {
        for attempt in 1..=self.max_name_attempts {
            let name = self.names.generate(extension, self.name_length);
            if !self.metadata.name_exists(kind, &name).await? {
                return Ok(name);
            }
            tracing::debug!(attempt, %name, "Generated name already in use");
        }

        Err(Error::Internal {
            operation: format!(
                "generate an unused {} name within {} attempts",
                kind.table(),
                self.max_name_attempts
            ),
        })
    }

    /// Upload a blob and find its public URI in the listing
    async fn store_blob(&self, name: &str, extension: &str, content: Bytes) -> Result<String> {
        self.blobs.upload(name, &format!("image/{extension}"), content).await?;

        let objects = self.blobs.list().await?;
        objects
            .into_iter()
            .find(|object| object.name == name)
            .map(|object| object.uri)
            .ok_or_else(|| Error::Consistency {
                message: format!("uploaded blob {name} is missing from the storage listing"),
            })
    }

    async fn delete_blob(&self, name: &str) -> Result<()> {
        self.blobs.delete(name).await.map_err(|e| {
            tracing::error!(%name, "Metadata removed but blob delete failed; blob is orphaned: {e}");
            Error::from(e)
        })
    }
}

fn team_member_not_found(id: TeamMemberId) -> Error {
    Error::NotFound {
        resource: ImageKind::TeamMember.to_string(),
        id: id.to_string(),
    }
}
