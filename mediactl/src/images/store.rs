//! Metadata persistence as seen by the upload flow.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::{Repository, StorageEntries, TeamMembers},
        models::{
            storage_entries::{StorageEntry, StorageEntryCreateDBRequest, StorageEntryFilter},
            team_members::{TeamMember, TeamMemberCreateDBRequest, TeamMemberFilter, TeamMemberUpdateDBRequest},
        },
    },
    types::{ImageKind, StorageEntryId, TeamMemberId},
};

/// Rows owning a blob. Every write is committed before the call returns.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Whether a row of `kind` already uses `name`
    async fn name_exists(&self, kind: ImageKind, name: &str) -> Result<bool>;

    async fn list_storage_entries(&self) -> Result<Vec<StorageEntry>>;
    async fn get_storage_entry_by_name(&self, name: &str) -> Result<Option<StorageEntry>>;
    async fn create_storage_entry(&self, request: &StorageEntryCreateDBRequest) -> Result<StorageEntry>;
    async fn delete_storage_entry(&self, id: StorageEntryId) -> Result<bool>;

    async fn list_team_members(&self) -> Result<Vec<TeamMember>>;
    async fn get_team_member(&self, id: TeamMemberId) -> Result<Option<TeamMember>>;
    async fn create_team_member(&self, request: &TeamMemberCreateDBRequest) -> Result<TeamMember>;
    async fn update_team_member(&self, id: TeamMemberId, request: &TeamMemberUpdateDBRequest) -> Result<TeamMember>;
    async fn delete_team_member(&self, id: TeamMemberId) -> Result<bool>;
}

/// PostgreSQL metadata store; one transaction per write
#[derive(Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    #[instrument(skip(self), err)]
    async fn name_exists(&self, kind: ImageKind, name: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        let count = match kind {
            ImageKind::StorageEntry => StorageEntries::new(&mut conn).count_by_name(name).await?,
            ImageKind::TeamMember => TeamMembers::new(&mut conn).count_by_name(name).await?,
        };
        Ok(count > 0)
    }

    async fn list_storage_entries(&self) -> Result<Vec<StorageEntry>> {
        let mut conn = self.pool.acquire().await?;
        StorageEntries::new(&mut conn).list(&StorageEntryFilter::default()).await
    }

    async fn get_storage_entry_by_name(&self, name: &str) -> Result<Option<StorageEntry>> {
        let mut conn = self.pool.acquire().await?;
        StorageEntries::new(&mut conn).get_by_name(name).await
    }

    async fn create_storage_entry(&self, request: &StorageEntryCreateDBRequest) -> Result<StorageEntry> {
        let mut tx = self.pool.begin().await?;
        let entry = StorageEntries::new(&mut tx).create(request).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn delete_storage_entry(&self, id: StorageEntryId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = StorageEntries::new(&mut tx).delete(id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        let mut conn = self.pool.acquire().await?;
        TeamMembers::new(&mut conn).list(&TeamMemberFilter::default()).await
    }

    async fn get_team_member(&self, id: TeamMemberId) -> Result<Option<TeamMember>> {
        let mut conn = self.pool.acquire().await?;
        TeamMembers::new(&mut conn).get_by_id(id).await
    }

    async fn create_team_member(&self, request: &TeamMemberCreateDBRequest) -> Result<TeamMember> {
        let mut tx = self.pool.begin().await?;
        let member = TeamMembers::new(&mut tx).create(request).await?;
        tx.commit().await?;
        Ok(member)
    }

    async fn update_team_member(&self, id: TeamMemberId, request: &TeamMemberUpdateDBRequest) -> Result<TeamMember> {
        let mut tx = self.pool.begin().await?;
        let member = TeamMembers::new(&mut tx).update(id, request).await?;
        tx.commit().await?;
        Ok(member)
    }

    async fn delete_team_member(&self, id: TeamMemberId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = TeamMembers::new(&mut tx).delete(id).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

#[cfg(test)]
pub use in_memory::InMemoryMetadataStore;

#[cfg(test)]
mod in_memory {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::MetadataStore;
    use crate::{
        db::{
            errors::{DbError, Result},
            models::{
                storage_entries::{StorageEntry, StorageEntryCreateDBRequest},
                team_members::{TeamMember, TeamMemberCreateDBRequest, TeamMemberUpdateDBRequest},
            },
        },
        types::{ImageKind, StorageEntryId, TeamMemberId},
    };

    #[derive(Default)]
    struct State {
        next_id: i64,
        storage: Vec<StorageEntry>,
        team: Vec<TeamMember>,
        /// Remaining `name_exists` calls that report a collision regardless of contents
        forced_collisions: usize,
    }

    /// Metadata store backed by process memory, with call counters for tests
    #[derive(Default)]
    pub struct InMemoryMetadataStore {
        state: Mutex<State>,
        name_checks: AtomicUsize,
        writes: AtomicUsize,
    }

    impl InMemoryMetadataStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn state(&self) -> std::sync::MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        /// Report the next `n` checked names as already taken
        pub fn force_collisions(&self, n: usize) {
            self.state().forced_collisions = n;
        }

        /// Number of `name_exists` calls so far
        pub fn name_checks(&self) -> usize {
            self.name_checks.load(Ordering::SeqCst)
        }

        /// Number of create, update and delete calls so far
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn storage_entries(&self) -> Vec<StorageEntry> {
            self.state().storage.clone()
        }

        pub fn team_members(&self) -> Vec<TeamMember> {
            self.state().team.clone()
        }

        fn unique_violation(table: &str, name: &str) -> DbError {
            DbError::UniqueViolation {
                constraint: Some(format!("{table}_generated_name_unique")),
                table: Some(table.to_string()),
                message: "duplicate key value violates unique constraint".to_string(),
                conflicting_value: Some(name.to_string()),
            }
        }
    }

    #[async_trait]
    impl MetadataStore for InMemoryMetadataStore {
        async fn name_exists(&self, kind: ImageKind, name: &str) -> Result<bool> {
            self.name_checks.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state();
            if state.forced_collisions > 0 {
                state.forced_collisions -= 1;
                return Ok(true);
            }
            Ok(match kind {
                ImageKind::StorageEntry => state.storage.iter().any(|e| e.generated_name == name),
                ImageKind::TeamMember => state.team.iter().any(|m| m.generated_name == name),
            })
        }

        async fn list_storage_entries(&self) -> Result<Vec<StorageEntry>> {
            let mut entries = self.state().storage.clone();
            entries.reverse();
            Ok(entries)
        }

        async fn get_storage_entry_by_name(&self, name: &str) -> Result<Option<StorageEntry>> {
            Ok(self.state().storage.iter().find(|e| e.generated_name == name).cloned())
        }

        async fn create_storage_entry(&self, request: &StorageEntryCreateDBRequest) -> Result<StorageEntry> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state();
            if state.storage.iter().any(|e| e.generated_name == request.generated_name) {
                return Err(Self::unique_violation("storage_entries", &request.generated_name));
            }
            state.next_id += 1;
            let entry = StorageEntry {
                id: state.next_id,
                generated_name: request.generated_name.clone(),
                uri: request.uri.clone(),
                created_at: Utc::now(),
            };
            state.storage.push(entry.clone());
            Ok(entry)
        }

        async fn delete_storage_entry(&self, id: StorageEntryId) -> Result<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state();
            let before = state.storage.len();
            state.storage.retain(|e| e.id != id);
            Ok(state.storage.len() < before)
        }

        async fn list_team_members(&self) -> Result<Vec<TeamMember>> {
            let mut members = self.state().team.clone();
            members.sort_by(|a, b| (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id)));
            Ok(members)
        }

        async fn get_team_member(&self, id: TeamMemberId) -> Result<Option<TeamMember>> {
            Ok(self.state().team.iter().find(|m| m.id == id).cloned())
        }

        async fn create_team_member(&self, request: &TeamMemberCreateDBRequest) -> Result<TeamMember> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state();
            if state.team.iter().any(|m| m.generated_name == request.generated_name) {
                return Err(Self::unique_violation("team_members", &request.generated_name));
            }
            state.next_id += 1;
            let now = Utc::now();
            let profile = request.profile.clone();
            let member = TeamMember {
                id: state.next_id,
                first_name: profile.first_name,
                last_name: profile.last_name,
                position: profile.position,
                email: profile.email,
                phone: profile.phone,
                linked_in: profile.linked_in,
                generated_name: request.generated_name.clone(),
                uri: request.uri.clone(),
                created_at: now,
                updated_at: now,
            };
            state.team.push(member.clone());
            Ok(member)
        }

        async fn update_team_member(&self, id: TeamMemberId, request: &TeamMemberUpdateDBRequest) -> Result<TeamMember> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state();
            let member = state.team.iter_mut().find(|m| m.id == id).ok_or(DbError::NotFound)?;
            let profile = request.profile.clone();
            member.first_name = profile.first_name;
            member.last_name = profile.last_name;
            member.position = profile.position;
            member.email = profile.email;
            member.phone = profile.phone;
            member.linked_in = profile.linked_in;
            if let Some(name) = &request.generated_name {
                member.generated_name = name.clone();
            }
            if let Some(uri) = &request.uri {
                member.uri = uri.clone();
            }
            member.updated_at = Utc::now();
            Ok(member.clone())
        }

        async fn delete_team_member(&self, id: TeamMemberId) -> Result<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state();
            let before = state.team.len();
            state.team.retain(|m| m.id != id);
            Ok(state.team.len() < before)
        }
    }
}
