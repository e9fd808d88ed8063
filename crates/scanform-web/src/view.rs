//! Template rendering.

use scanform_http::{Error, Html, IntoResponse, Response};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tera::Tera;
use tracing::error;

pub use tera::Context;

/// Errors raised while loading templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template directory failed to load or parse.
    #[error("template load failed: {0}")]
    Load(#[from] tera::Error),
}

/// Shared template engine.
///
/// Templates load once at startup. With auto-reload on, every render
/// picks up edits from disk first, so development does not need a
/// restart; production keeps the parsed set as-is.
#[derive(Clone)]
pub struct Templates {
    tera: Arc<RwLock<Tera>>,
    auto_reload: bool,
}

impl Templates {
    /// Load every template under the crate's `templates/` directory.
    pub fn load(auto_reload: bool) -> Result<Self, TemplateError> {
        let glob = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html");
        let tera = Tera::new(glob)?;
        Ok(Self {
            tera: Arc::new(RwLock::new(tera)),
            auto_reload,
        })
    }

    /// Render a template to an HTML response.
    ///
    /// Failures render as a plain 500 rather than propagating.
    pub fn render(&self, name: &str, context: &Context) -> Response {
        if self.auto_reload {
            if let Err(err) = self.write_lock().full_reload() {
                error!(%err, "Template reload failed");
            }
        }

        match self.read_lock().render(name, context) {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                error!(template = name, %err, "Template render failed");
                Error::internal("Template rendering failed").into_response()
            }
        }
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Tera> {
        self.tera.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Tera> {
        self.tera.write().unwrap_or_else(|err| err.into_inner())
    }
}
