//! HTTP layer: HTML pages and form handlers.
//!
//! - **[`handlers`]**: Axum route handlers for the storage and team pages
//! - **[`models`]**: Form data parsed from requests
//!
//! # Pages
//!
//! - **Storage** (`/storage/*`): images not attached to anything, listed by generated name
//! - **Team** (`/team/*`): team member profiles, each with one photo
//!
//! Every page requires the user header set by the authenticating proxy, and every form post
//! requires a valid anti-forgery token.

pub mod handlers;
pub mod models;
