//! Form data parsed from requests.
//!
//! - [`forms`]: multipart upload forms and url-encoded action forms

pub mod forms;
