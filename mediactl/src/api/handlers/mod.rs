//! HTTP request handlers for the HTML pages.
//!
//! # Handler Modules
//!
//! - [`storage`]: listing, uploading and deleting standalone images
//! - [`team`]: team member listing, details, create, edit and delete
//!
//! Handlers render views directly. Validation failures on upload forms re-render the form with a
//! banner; storage and database failures propagate as [`crate::errors::Error`] and become
//! plain-text error responses.

pub mod storage;
pub mod team;

use crate::{
    AppState,
    auth::{CurrentUser, csrf},
    errors::Result,
};

/// Anti-forgery token to embed in forms rendered for `user`
pub(crate) fn form_token(state: &AppState, user: &CurrentUser) -> Result<String> {
    csrf::issue_token(csrf::secret_key(&state.config)?, &user.email)
}

/// Reject form posts without a valid token for `user`
pub(crate) fn check_form_token(state: &AppState, user: &CurrentUser, token: Option<&str>) -> Result<()> {
    csrf::verify_token(csrf::secret_key(&state.config)?, &user.email, token)
}
