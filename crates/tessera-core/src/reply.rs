//! Handler return values.

use std::fmt;
use std::future::Future;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;

use crate::{Body, Response, TesseraResult, View};

/// What a handler produces: one of five shapes, each normalized into a
/// [`Response`] by its own rule.
pub enum Reply {
    /// An already-final response, passed through unchanged.
    Response(Response),
    /// A result that is not available yet.
    Deferred(BoxFuture<'static, TesseraResult<Reply>>),
    /// A template to render.
    View(View),
    /// Structured data; objects and arrays are sent as JSON.
    Structured(Value),
    /// A plain payload sent as a `200` with no headers.
    Literal(Body),
}

/// The result every handler returns.
pub type HandlerResult = TesseraResult<Reply>;

impl Reply {
    /// Defers to a future.
    ///
    /// ```rust
    /// use tessera_core::Reply;
    ///
    /// let reply = Reply::deferred(async { Ok(Reply::from("done")) });
    /// assert!(matches!(reply, Reply::Deferred(_)));
    /// ```
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = TesseraResult<Reply>> + Send + 'static,
    {
        Self::Deferred(future.boxed())
    }

    /// Serializes `data` into a structured reply.
    pub fn json<T: Serialize + ?Sized>(data: &T) -> TesseraResult<Self> {
        Ok(Self::Structured(serde_json::to_value(data)?))
    }

    /// A short name for the variant, used in logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Response(_) => "response",
            Self::Deferred(_) => "deferred",
            Self::View(_) => "view",
            Self::Structured(_) => "structured",
            Self::Literal(_) => "literal",
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(r) => f.debug_tuple("Response").field(r).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::View(v) => f.debug_tuple("View").field(v).finish(),
            Self::Structured(v) => f.debug_tuple("Structured").field(v).finish(),
            Self::Literal(b) => f.debug_tuple("Literal").field(b).finish(),
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<View> for Reply {
    fn from(view: View) -> Self {
        Self::View(view)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Self::Literal(Body::from(s))
    }
}

impl From<&'static str> for Reply {
    fn from(s: &'static str) -> Self {
        Self::Literal(Body::from(s))
    }
}

impl From<Bytes> for Reply {
    fn from(bytes: Bytes) -> Self {
        Self::Literal(Body::Full(bytes))
    }
}

impl From<Body> for Reply {
    fn from(body: Body) -> Self {
        Self::Literal(body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_conversions_pick_the_right_shape() {
        assert_eq!(Reply::from(Response::ok()).kind(), "response");
        assert_eq!(Reply::from(View::new("home")).kind(), "view");
        assert_eq!(Reply::from(json!({"a": 1})).kind(), "structured");
        assert_eq!(Reply::from("hello").kind(), "literal");
        assert_eq!(Reply::from(String::from("hello")).kind(), "literal");
        assert_eq!(Reply::from(Bytes::from_static(b"raw")).kind(), "literal");
    }

    #[test]
    fn test_json_reply() {
        #[derive(Serialize)]
        struct User {
            id: u32,
        }

        match Reply::json(&User { id: 4 }).unwrap() {
            Reply::Structured(value) => assert_eq!(value, json!({"id": 4})),
            other => panic!("expected structured, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deferred_resolves() {
        let Reply::Deferred(future) = Reply::deferred(async { Ok(Reply::from("later")) }) else {
            panic!("expected deferred");
        };
        assert_eq!(future.await.unwrap().kind(), "literal");
    }
}
