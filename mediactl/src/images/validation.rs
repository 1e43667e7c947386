//! Checks that run before an upload has any side effect.

use thiserror::Error;

use crate::db::models::team_members::TeamMemberProfile;

/// Reasons an upload is rejected up front. The messages are shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("You can only upload an image!")]
    NotAnImage,

    #[error("Formats supported: {}", supported.join(", "))]
    UnsupportedFormat { subtype: String, supported: Vec<String> },

    #[error("All parameters needs to be filled!")]
    MissingFile,

    #[error("{field} is required")]
    MissingField { field: &'static str },
}

/// Check a declared content type such as `image/png; charset=binary` against the allow-list.
///
/// Returns the normalised subtype, which doubles as the file extension of the stored blob.
pub fn validate_content_type(content_type: &str, allowed: &[String]) -> Result<String, ValidationError> {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

    let Some((kind, subtype)) = essence.split_once('/') else {
        return Err(ValidationError::NotAnImage);
    };
    if kind != "image" {
        return Err(ValidationError::NotAnImage);
    }

    if !allowed.iter().any(|format| format.eq_ignore_ascii_case(subtype)) {
        return Err(ValidationError::UnsupportedFormat {
            subtype: subtype.to_string(),
            supported: allowed.to_vec(),
        });
    }

    Ok(subtype.to_string())
}

/// Required team member fields must be present and not blank
pub fn validate_profile(profile: &TeamMemberProfile) -> Result<(), ValidationError> {
    let required = [
        ("First name", &profile.first_name),
        ("Last name", &profile.last_name),
        ("Position", &profile.position),
        ("Email", &profile.email),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField { field });
        }
    }
    Ok(())
}
