//! Template rendering with minijinja.

use std::path::Path;

use bytes::Bytes;
use minijinja::{path_loader, Environment, ErrorKind};
use parking_lot::RwLock;
use serde_json::Value;
use tessera_core::{ViewEngine, ViewError};
use tracing::debug;

/// A [`ViewEngine`] backed by a minijinja environment.
///
/// Templates are looked up by name, either registered in memory or loaded
/// from a directory (`users/show.html` → `<dir>/users/show.html`). With
/// caching off, directory templates are reloaded on every render.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use tessera_core::ViewEngine;
/// use tessera_server::TemplateViews;
///
/// let views = TemplateViews::in_memory();
/// views.add_template("hello", "Hello {{ name }}!").unwrap();
///
/// let body = views.render("hello", &json!({"name": "Ada"})).unwrap();
/// assert_eq!(&body[..], b"Hello Ada!");
/// ```
pub struct TemplateViews {
    env: RwLock<Environment<'static>>,
    reload: bool,
}

impl TemplateViews {
    /// Loads templates from `dir`. When `cache` is false, loaded templates
    /// are dropped before each render so edits show up immediately.
    pub fn from_dir(dir: impl AsRef<Path>, cache: bool) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        Self {
            env: RwLock::new(env),
            reload: !cache,
        }
    }

    /// An engine with no loader; templates must be added explicitly.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            env: RwLock::new(Environment::new()),
            reload: false,
        }
    }

    /// Registers a template under `name`.
    pub fn add_template(&self, name: impl Into<String>, source: impl Into<String>) -> Result<(), ViewError> {
        let name = name.into();
        self.env
            .write()
            .add_template_owned(name.clone(), source.into())
            .map_err(|err| map_error(&name, &err))
    }
}

impl ViewEngine for TemplateViews {
    fn render(&self, template: &str, data: &Value) -> Result<Bytes, ViewError> {
        if self.reload {
            self.env.write().clear_templates();
        }

        debug!(template, "rendering view");
        let env = self.env.read();
        let rendered = env
            .get_template(template)
            .and_then(|tmpl| tmpl.render(data))
            .map_err(|err| map_error(template, &err))?;
        Ok(Bytes::from(rendered))
    }
}

impl std::fmt::Debug for TemplateViews {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateViews")
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

fn map_error(template: &str, err: &minijinja::Error) -> ViewError {
    if err.kind() == ErrorKind::TemplateNotFound {
        ViewError::TemplateNotFound(template.to_string())
    } else {
        ViewError::Render {
            template: template.to_string(),
            message: err.to_string(),
        }
    }
}
