use crate::blob::BlobError;
use crate::db::errors::DbError;
use crate::images::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated,

    /// Anti-forgery token missing or not valid for the current user
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Upload body larger than `images.max_upload_size`
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Upload rejected before any side effect; handlers usually render these as a banner
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Blob backend reported a failure for an upload or delete
    #[error("Blob storage error: {0}")]
    BlobStore(#[from] BlobError),

    /// Blob store and metadata store disagree (e.g. an uploaded blob is missing from the listing)
    #[error("Inconsistent storage state: {message}")]
    Consistency { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::BlobStore(_) | Error::Consistency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated => "Authentication required".to_string(),
            Error::Forbidden { message } => message.clone(),
            Error::BadRequest { message } | Error::PayloadTooLarge { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Validation(e) => e.to_string(),
            // Backend status text is passed through as-is
            Error::BlobStore(e) => e.status(),
            Error::Consistency { .. } => "Problem with storage. Please try again.".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, .. } => match table.as_deref() {
                    Some("storage_entries") | Some("team_members") => {
                        "An image with this generated name already exists. Please retry the upload.".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::BlobStore(_) | Error::Consistency { .. } => {
                tracing::error!("Storage error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } | Error::NotFound { .. } | Error::Validation(_) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_store_errors_surface_backend_status() {
        let err = Error::BlobStore(BlobError::Backend {
            status: "AccessDenied: bucket policy".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "AccessDenied: bucket policy");
    }

    #[test]
    fn database_errors_map_to_status_codes() {
        assert_eq!(Error::Database(DbError::NotFound).status_code(), StatusCode::NOT_FOUND);
        let conflict = Error::Database(DbError::UniqueViolation {
            constraint: Some("storage_entries_generated_name_unique".to_string()),
            table: Some("storage_entries".to_string()),
            message: "duplicate key".to_string(),
            conflicting_value: None,
        });
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert!(conflict.user_message().contains("generated name"));
    }

    #[test]
    fn unauthenticated_is_401_with_generic_text() {
        assert_eq!(Error::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Unauthenticated.user_message(), "Authentication required");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = Error::Other(anyhow::anyhow!("connection refused to 10.0.0.4"));
        assert_eq!(err.user_message(), "Internal server error");
        let err = Error::Consistency {
            message: "blob abc.png missing from listing".to_string(),
        };
        assert!(!err.user_message().contains("abc.png"));
    }
}
