//! Server-side HTML views.
//!
//! Templates live in `templates/` and are embedded into the binary at build time. Every page
//! extends `layout.html`.

use axum::response::Html;
use minijinja::{Environment, ErrorKind};
use rust_embed::RustEmbed;
use serde::Serialize;

use crate::errors::{Error, Result};

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// Outcome banner shown above upload forms
#[derive(Debug, Clone, Default, Serialize)]
pub struct Banner {
    pub is_response: bool,
    pub is_success: bool,
    pub message: String,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            is_response: true,
            is_success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_response: true,
            is_success: false,
            message: message.into(),
        }
    }
}

pub struct Views {
    env: Environment<'static>,
}

impl Default for Views {
    fn default() -> Self {
        Self::new()
    }
}

impl Views {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| match Templates::get(name) {
            Some(file) => String::from_utf8(file.data.into_owned()).map(Some).map_err(|e| {
                minijinja::Error::new(ErrorKind::InvalidOperation, format!("template {name} is not valid UTF-8")).with_source(e)
            }),
            None => Ok(None),
        });
        Self { env }
    }

    /// Render a template by its path under `templates/`
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>> {
        let template = self.env.get_template(name).map_err(|e| Error::Internal {
            operation: format!("load template {name}: {e}"),
        })?;
        let body = template.render(ctx).map_err(|e| Error::Internal {
            operation: format!("render template {name}: {e:#}"),
        })?;
        Ok(Html(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn renders_upload_page_with_banner() {
        let views = Views::new();
        let Html(body) = views
            .render(
                "storage/upload.html",
                context! {
                    user => "ada@example.com",
                    csrf_token => "tok",
                    formats => vec!["png", "jpg"],
                    banner => Banner::failure("You can only upload an image!"),
                },
            )
            .unwrap();

        assert!(body.contains("You can only upload an image!"));
        assert!(body.contains("name=\"csrf_token\" value=\"tok\""));
        assert!(body.contains("ada@example.com"));
    }

    #[test]
    fn escapes_user_content() {
        let views = Views::new();
        let Html(body) = views
            .render(
                "storage/upload.html",
                context! {
                    user => "<script>alert(1)</script>",
                    csrf_token => "tok",
                    formats => Vec::<String>::new(),
                    banner => Banner::default(),
                },
            )
            .unwrap();

        assert!(!body.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn every_template_loads() {
        let views = Views::new();
        for name in Templates::iter() {
            assert!(views.env.get_template(&name).is_ok(), "template {name} failed to load");
        }
    }

    #[test]
    fn unknown_template_is_internal_error() {
        let views = Views::new();
        assert!(matches!(views.render("missing.html", ()), Err(Error::Internal { .. })));
    }
}
