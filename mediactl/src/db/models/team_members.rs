//! Database models for team members.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::TeamMemberId;

/// Database entity model
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeamMember {
    pub id: TeamMemberId,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
    pub phone: Option<String>,
    pub linked_in: Option<String>,
    /// Name of the photo in blob storage
    pub generated_name: String,
    /// Public URI of the photo
    pub uri: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamMember {
    pub fn profile(&self) -> TeamMemberProfile {
        TeamMemberProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            position: self.position.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            linked_in: self.linked_in.clone(),
        }
    }
}

/// The user-editable fields of a team member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamMemberProfile {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
    pub phone: Option<String>,
    pub linked_in: Option<String>,
}

/// Request for creating a team member
#[derive(Debug, Clone)]
pub struct TeamMemberCreateDBRequest {
    pub profile: TeamMemberProfile,
    pub generated_name: String,
    pub uri: String,
}

/// Request for updating a team member.
///
/// The profile is always replaced as a whole; the photo fields only change when a replacement
/// image was uploaded.
#[derive(Debug, Clone)]
pub struct TeamMemberUpdateDBRequest {
    pub profile: TeamMemberProfile,
    pub generated_name: Option<String>,
    pub uri: Option<String>,
}

/// Response type (same as entity for now)
pub type TeamMemberDBResponse = TeamMember;

/// Filter for listing team members.
///
/// The pages show every row, so the default has no limit.
#[derive(Debug, Clone, Default)]
pub struct TeamMemberFilter {
    pub skip: i64,
    /// `None` returns every row after `skip`
    pub limit: Option<i64>,
}
