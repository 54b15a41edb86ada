//! Renderable views.
//!
//! A [`View`] is a marker returned by handlers: a template name plus the data
//! to render it with. Rendering happens later, during response
//! normalization, through whatever [`ViewEngine`] the application installed.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by a view engine.
#[derive(Error, Debug)]
pub enum ViewError {
    /// The template does not exist.
    #[error("template `{0}` not found")]
    TemplateNotFound(String),

    /// The template exists but failed to render.
    #[error("failed to render `{template}`: {message}")]
    Render {
        /// The template name.
        template: String,
        /// Engine-provided detail.
        message: String,
    },

    /// No view engine is installed.
    #[error("no view engine is configured")]
    Unconfigured,
}

/// Renders a template with a data mapping.
pub trait ViewEngine: Send + Sync + 'static {
    /// Renders `template` with `data` into a byte payload.
    fn render(&self, template: &str, data: &Value) -> Result<Bytes, ViewError>;
}

/// The engine used when the application installs none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoViews;

impl ViewEngine for NoViews {
    fn render(&self, _template: &str, _data: &Value) -> Result<Bytes, ViewError> {
        Err(ViewError::Unconfigured)
    }
}

/// A template name with its data, rendered during normalization.
///
/// # Example
///
/// ```rust
/// use tessera_core::View;
///
/// let view = View::new("users/show")
///     .with("name", "Ada")?
///     .with("admin", true)?;
/// assert_eq!(view.template(), "users/show");
/// assert_eq!(view.data()["name"], "Ada");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct View {
    template: String,
    data: Map<String, Value>,
    status: StatusCode,
    headers: HeaderMap,
}

impl View {
    /// Creates a view with empty data.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            data: Map::new(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Adds one entry to the data mapping.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> serde_json::Result<Self> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.into(), value);
        Ok(self)
    }

    /// Merges a serializable mapping into the data.
    ///
    /// `null` adds nothing. Any other value that does not serialize to a
    /// mapping is rejected.
    pub fn with_data(mut self, data: impl Serialize) -> serde_json::Result<Self> {
        match serde_json::to_value(data)? {
            Value::Object(map) => self.data.extend(map),
            Value::Null => {}
            other => {
                return Err(serde::ser::Error::custom(format!(
                    "view data for `{}` must be a mapping, got {}",
                    self.template,
                    value_kind(&other)
                )))
            }
        }
        Ok(self)
    }

    /// Sets the response status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a response header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The template name.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The data mapping.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Splits the view into template, data, status and headers.
    pub fn into_parts(self) -> (String, Value, StatusCode, HeaderMap) {
        (self.template, Value::Object(self.data), self.status, self.headers)
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
