use std::collections::HashMap;

use axum::{extract::Multipart, http::StatusCode};
use serde::Deserialize;

use crate::{
    auth::csrf,
    db::models::team_members::TeamMemberProfile,
    errors::{Error, Result},
    images::UploadFile,
};

/// Name of the multipart part carrying the image
pub const FILE_FIELD: &str = "file";

/// A parsed `multipart/form-data` upload: at most one file plus text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of the form into memory.
    ///
    /// A file part with no file name and no content (what browsers send when no file was chosen)
    /// counts as no file.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or("").to_string();

            if field_name == FILE_FIELD {
                let file_name = field.file_name().filter(|name| !name.is_empty()).map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM.as_ref())
                    .to_string();
                let content = field.bytes().await.map_err(multipart_error)?;

                if file_name.is_none() && content.is_empty() {
                    continue;
                }

                tracing::debug!(file_name = ?file_name, %content_type, size = content.len(), "Received file part");
                form.file = Some(UploadFile {
                    content_type,
                    file_name,
                    content,
                });
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(field_name, value);
            }
        }

        Ok(form)
    }

    /// A text field, trimmed; blank values count as absent
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.field(csrf::FORM_FIELD)
    }

    /// Team member profile fields; missing required fields come back empty and are caught by
    /// validation
    pub fn profile(&self) -> TeamMemberProfile {
        let text = |name: &str| self.field(name).unwrap_or_default().to_string();
        TeamMemberProfile {
            first_name: text("first_name"),
            last_name: text("last_name"),
            position: text("position"),
            email: text("email"),
            phone: self.field("phone").map(str::to_string),
            linked_in: self.field("linked_in").map(str::to_string),
        }
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            message: "Uploaded file is too large".to_string(),
        }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", e.body_text()),
        }
    }
}

/// `POST /storage/delete`
#[derive(Debug, Deserialize)]
pub struct DeleteImageForm {
    #[serde(rename = "ImageName")]
    pub image_name: Option<String>,
    pub csrf_token: Option<String>,
}

/// Forms whose only field is the anti-forgery token
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    pub csrf_token: Option<String>,
}
