//! Anti-forgery tokens for HTML forms.
//!
//! Tokens are `base64url(HMAC-SHA256(secret_key, "csrf:" + user email))`. They stay valid for as
//! long as the secret key is unchanged.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{
    config::Config,
    errors::{Error, Result},
};

type HmacSha256 = Hmac<Sha256>;

/// Name of the hidden form field carrying the token
pub const FORM_FIELD: &str = "csrf_token";

fn mac_for(secret: &str, user: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| Error::Internal {
        operation: format!("initialise anti-forgery MAC: {e}"),
    })?;
    mac.update(b"csrf:");
    mac.update(user.as_bytes());
    Ok(mac)
}

/// The configured signing secret
pub fn secret_key(config: &Config) -> Result<&str> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sign anti-forgery token: secret_key is not configured".to_string(),
    })
}

/// Token to embed in forms rendered for `user`
pub fn issue_token(secret: &str, user: &str) -> Result<String> {
    let signature = mac_for(secret, user)?.finalize().into_bytes();
    Ok(URL_SAFE_NO_PAD.encode(signature))
}

/// Check a submitted token against `user`, in constant time
pub fn verify_token(secret: &str, user: &str, token: Option<&str>) -> Result<()> {
    let forbidden = || Error::Forbidden {
        message: "Invalid or missing anti-forgery token".to_string(),
    };

    let token = token.filter(|t| !t.is_empty()).ok_or_else(forbidden)?;
    let submitted = URL_SAFE_NO_PAD.decode(token).map_err(|_| forbidden())?;

    mac_for(secret, user)?.verify_slice(&submitted).map_err(|_| forbidden())
}
