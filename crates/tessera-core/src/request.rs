//! Incoming requests.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::uri::InvalidUri;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for consecutive requests
/// sorted by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request as seen by middleware and handlers.
///
/// The body is fully buffered. Middleware may attach a structured
/// interpretation of it with [`Request::set_parsed_body`].
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use tessera_core::Request;
///
/// let request = Request::new(Method::POST, "/users?page=2")
///     .with_header("content-type", "application/json")
///     .with_body(r#"{"name":"Ada"}"#);
///
/// assert_eq!(request.path(), "/users");
/// assert_eq!(request.content_type(), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    parsed_body: Option<Value>,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    ///
    /// An unparsable `uri` falls back to `/` and is logged; use
    /// [`Request::try_new`] to reject it instead.
    pub fn new(method: Method, uri: &str) -> Self {
        let uri = uri.parse().unwrap_or_else(|err| {
            warn!(uri, error = %err, "invalid request URI, using `/`");
            Uri::from_static("/")
        });
        Self::with_uri(method, uri)
    }

    /// Creates a request with no headers and an empty body, failing on an
    /// unparsable `uri`.
    pub fn try_new(method: Method, uri: &str) -> Result<Self, InvalidUri> {
        Ok(Self::with_uri(method, uri.parse()?))
    }

    fn with_uri(method: Method, uri: Uri) -> Self {
        Self {
            id: RequestId::new(),
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            parsed_body: None,
        }
    }

    /// Builds a request from its `http` parts and collected body.
    pub fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            id: RequestId::new(),
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            parsed_body: None,
        }
    }

    /// Adds a header. Invalid names or values are logged and skipped; use
    /// [`Request::try_with_header`] to reject them instead.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match parse_header(name, value) {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(err) => warn!(header = name, error = %err, "invalid request header skipped"),
        }
        self
    }

    /// Adds a header, failing on an invalid name or value.
    pub fn try_with_header(mut self, name: &str, value: &str) -> Result<Self, http::Error> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The request id.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The URI path, without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The raw query string.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
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

    /// The raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The structured body attached by middleware.
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    /// Attaches a structured interpretation of the body.
    pub fn set_parsed_body(&mut self, value: Value) {
        self.parsed_body = Some(value);
    }

    /// Deserializes the structured body, or the raw body when none was
    /// attached.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match &self.parsed_body {
            Some(value) => T::deserialize(value),
            None => serde_json::from_slice(&self.body),
        }
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), http::Error> {
    let name = HeaderName::from_bytes(name.as_bytes())?;
    let value = HeaderValue::from_str(value)?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[test]
    fn test_path_and_query() {
        let request = Request::new(Method::GET, "/search?q=rust");
        assert_eq!(request.path(), "/search");
        assert_eq!(request.query(), Some("q=rust"));
        assert_eq!(request.method(), Method::GET);
    }

    #[test]
    fn test_invalid_uri_falls_back_to_root() {
        assert_eq!(Request::new(Method::GET, "not a uri").path(), "/");
    }

    #[test]
    fn test_try_new_rejects_invalid_uri() {
        assert!(Request::try_new(Method::GET, "not a uri").is_err());
        let request = Request::try_new(Method::DELETE, "/users/9").unwrap();
        assert_eq!(request.path(), "/users/9");
        assert_eq!(request.method(), Method::DELETE);
    }

    #[test]
    fn test_try_with_header_rejects_invalid_input() {
        let request = Request::new(Method::GET, "/");
        assert!(request.clone().try_with_header("bad header", "v").is_err());
        assert!(request.clone().try_with_header("x-ok", "line\nbreak").is_err());

        let skipped = request.with_header("bad header", "v");
        assert!(skipped.headers().is_empty());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = Request::new(Method::GET, "/").with_header("X-Trace", "abc");
        assert_eq!(request.header("x-trace"), Some("abc"));
        assert_eq!(request.header("missing"), None);
    }

    #[test]
    fn test_json_prefers_parsed_body() {
        #[derive(Deserialize)]
        struct User {
            name: String,
        }

        let mut request = Request::new(Method::POST, "/").with_body(r#"{"name":"raw"}"#);
        assert_eq!(request.json::<User>().unwrap().name, "raw");

        request.set_parsed_body(serde_json::json!({"name": "parsed"}));
        assert_eq!(request.json::<User>().unwrap().name, "parsed");
    }

    #[test]
    fn test_from_parts() {
        let (parts, ()) = http::Request::builder()
            .method(Method::PUT)
            .uri("/items/1")
            .header("content-type", "text/plain")
            .body(())
            .unwrap()
            .into_parts();

        let request = Request::from_parts(parts, Bytes::from_static(b"hi"));
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.content_type(), Some("text/plain"));
        assert_eq!(&request.body()[..], b"hi");
        assert!(request.parsed_body().is_none());
    }
}
