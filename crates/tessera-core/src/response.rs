//! Outgoing responses.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::TesseraResult;

/// Boxed error type carried by streaming bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A streaming body source.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A response body: an in-memory payload or a stream of chunks.
pub enum Body {
    /// The whole payload.
    Full(Bytes),
    /// Chunks produced on demand.
    Stream(BodyStream),
}

impl Body {
    /// An empty in-memory body.
    pub const fn empty() -> Self {
        Self::Full(Bytes::new())
    }

    /// Returns the payload of an in-memory body.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Full(bytes) => Some(bytes),
            Self::Stream(_) => None,
        }
    }

    /// Returns `true` for streaming bodies.
    pub const fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(bytes).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Full(bytes)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Full(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::Full(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Self::Full(Bytes::from(v))
    }
}

/// A final response: status, headers and body.
///
/// Builder methods consume and return the response, so a response can be
/// derived from another with extra headers without mutating shared state.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use tessera_core::Response;
///
/// let created = Response::json(&serde_json::json!({"id": 7}), StatusCode::CREATED).unwrap();
/// assert_eq!(created.status(), StatusCode::CREATED);
/// assert_eq!(created.content_type(), Some("application/json"));
///
/// let moved = Response::redirect("/login", StatusCode::FOUND).unwrap();
/// assert_eq!(moved.header("location"), Some("/login"));
/// ```
#[derive(Debug, Default)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// Creates a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// An empty `200 OK`.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A `text/plain` response.
    pub fn text(status: StatusCode, body: impl Into<Body>) -> Self {
        Self::new(status, body).with_static_header(CONTENT_TYPE, "text/plain")
    }

    /// Serializes `data` as an `application/json` response.
    pub fn json<T: Serialize + ?Sized>(data: &T, status: StatusCode) -> TesseraResult<Self> {
        let body = serde_json::to_vec(data)?;
        Ok(Self::new(status, body).with_static_header(CONTENT_TYPE, "application/json"))
    }

    /// A redirect to `to`.
    pub fn redirect(to: &str, status: StatusCode) -> TesseraResult<Self> {
        let location = HeaderValue::from_str(to).map_err(http::Error::from)?;
        Ok(Self::new(status, Body::empty()).with_header(LOCATION, location))
    }

    /// A response whose body is produced by `stream`.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self::new(StatusCode::OK, Body::Stream(Box::pin(stream)))
    }

    /// Replaces the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing earlier values of the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    fn with_static_header(self, name: HeaderName, value: &'static str) -> Self {
        self.with_header(name, HeaderValue::from_static(value))
    }

    /// Sets every header in `headers`; the last value per name wins.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers {
            if let Some(name) = name {
                self.headers.insert(name, value);
            }
        }
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// All headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `content-type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// The body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The payload of an in-memory body.
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_bytes()
    }

    /// Splits the response into status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }
}
