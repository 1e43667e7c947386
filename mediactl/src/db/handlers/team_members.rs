//! Database repository for team members.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::team_members::{TeamMember, TeamMemberCreateDBRequest, TeamMemberDBResponse, TeamMemberFilter, TeamMemberUpdateDBRequest},
    },
    types::TeamMemberId,
};

const COLUMNS: &str = "id, first_name, last_name, position, email, phone, linked_in, generated_name, uri, created_at, updated_at";

pub struct TeamMembers<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for TeamMembers<'c> {
    type CreateRequest = TeamMemberCreateDBRequest;
    type Response = TeamMemberDBResponse;
    type Id = TeamMemberId;
    type Filter = TeamMemberFilter;

    #[instrument(skip(self, request), fields(generated_name = %request.generated_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let profile = &request.profile;
        let member = sqlx::query_as::<_, TeamMember>(&format!(
            r#"
            INSERT INTO team_members (first_name, last_name, position, email, phone, linked_in, generated_name, uri)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.position)
        .bind(&profile.email)
        .bind(profile.phone.as_deref())
        .bind(profile.linked_in.as_deref())
        .bind(&request.generated_name)
        .bind(&request.uri)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(member)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let member = sqlx::query_as::<_, TeamMember>(&format!("SELECT {COLUMNS} FROM team_members WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(member)
    }

    #[instrument(skip(self, filter), fields(limit = ?filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let members = sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {COLUMNS} FROM team_members ORDER BY last_name, first_name, id LIMIT $1 OFFSET $2"
        ))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(members)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> TeamMembers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Number of members whose photo uses a generated name; zero means the name is free
    #[instrument(skip(self), err)]
    pub async fn count_by_name(&mut self, generated_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE generated_name = $1")
            .bind(generated_name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Replace the profile, and the photo name and URI when given.
    /// Fails with `DbError::NotFound` when the row is gone.
    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: TeamMemberId, request: &TeamMemberUpdateDBRequest) -> Result<TeamMember> {
        let profile = &request.profile;
        let member = sqlx::query_as::<_, TeamMember>(&format!(
            r#"
            UPDATE team_members
            SET first_name = $2,
                last_name = $3,
                position = $4,
                email = $5,
                phone = $6,
                linked_in = $7,
                generated_name = COALESCE($8, generated_name),
                uri = COALESCE($9, uri),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.position)
        .bind(&profile.email)
        .bind(profile.phone.as_deref())
        .bind(profile.linked_in.as_deref())
        .bind(request.generated_name.as_deref())
        .bind(request.uri.as_deref())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(member)
    }
}
