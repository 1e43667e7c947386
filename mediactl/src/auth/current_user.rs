use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    AppState,
    config::Config,
    errors::{Error, Result},
};

/// The user the authenticating proxy signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub email: String,
}

/// Extract the user from the trusted proxy header.
/// Returns `None` when the header is absent, blank or not valid UTF-8.
fn user_from_proxy_header(parts: &Parts, config: &Config) -> Option<CurrentUser> {
    let email = parts
        .headers
        .get(&config.auth.proxy_header.header_name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())?;

    Some(CurrentUser { email: email.to_string() })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match user_from_proxy_header(parts, &state.config) {
            Some(user) => {
                trace!("Authenticated {} via proxy header", user.email);
                Ok(user)
            }
            None => Err(Error::Unauthenticated),
        }
    }
}
