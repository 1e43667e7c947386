//! Authentication and anti-forgery protection.
//!
//! The service sits behind an authenticating reverse proxy. The proxy forwards the signed-in
//! user's email in a trusted header (`auth.proxy_header.header_name`); requests without it are
//! rejected with 401.
//!
//! Every form that mutates state carries an anti-forgery token bound to the current user. The
//! token is an HMAC of the user's email keyed with `secret_key`, so it needs no server-side
//! storage.
//!
//! # Modules
//!
//! - [`current_user`]: extractor for the authenticated user
//! - [`csrf`]: issuing and checking anti-forgery tokens

pub mod csrf;
pub mod current_user;

pub use current_user::CurrentUser;
