//! Test request building.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method};
use serde::Serialize;
use tessera_core::Request;

use crate::error::TestError;

/// Builder for a request sent through a [`TestClient`](crate::TestClient).
///
/// Header and body errors are remembered and reported by [`build`](Self::build)
/// so the builder chain itself never fails.
#[derive(Debug)]
#[must_use]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Starts a request.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Sets a header, replacing earlier values of the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => self.fail(TestError::RequestBuild(format!("invalid header `{name}`"))),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets a bearer `Authorization` header.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header(AUTHORIZATION.as_str(), value)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the body and marks it `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Bytes::from(body);
                self.content_type("application/json")
            }
            Err(err) => {
                self.fail(TestError::Json(err));
                self
            }
        }
    }

    /// Builds the request.
    pub fn build(self) -> Result<Request, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut builder = http::Request::builder().method(self.method).uri(&self.uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers;
        }
        let (parts, ()) = builder
            .body(())
            .map_err(|err| TestError::RequestBuild(format!("{}: {err}", self.uri)))?
            .into_parts();

        Ok(Request::from_parts(parts, self.body))
    }

    fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_carries_headers_and_body() {
        let request = TestRequestBuilder::new(Method::POST, "/users?page=2")
            .header("X-Trace", "abc")
            .body("raw")
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/users");
        assert_eq!(request.query(), Some("page=2"));
        assert_eq!(request.header("x-trace"), Some("abc"));
        assert_eq!(&request.body()[..], b"raw");
    }

    #[test]
    fn test_json_sets_content_type() {
        let request = TestRequestBuilder::new(Method::POST, "/")
            .json(&serde_json::json!({"a": 1}))
            .build()
            .unwrap();

        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(&request.body()[..], br#"{"a":1}"#);
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let result = TestRequestBuilder::new(Method::GET, "/")
            .header("bad header", "x")
            .build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }

    #[test]
    fn test_invalid_uri_reported_on_build() {
        let result = TestRequestBuilder::new(Method::GET, "http://[::1").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }
}
