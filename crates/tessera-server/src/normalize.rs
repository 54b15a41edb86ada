//! Reply normalization.
//!
//! Handlers return a [`Reply`]; the transport needs a [`Response`]. The
//! normalizer picks a rule per reply shape:
//!
//! | Reply                        | Response                                   |
//! |------------------------------|--------------------------------------------|
//! | `Deferred`                   | settled later, then normalized recursively |
//! | `View`                       | rendered body, the view's status/headers   |
//! | `Response`                   | unchanged                                  |
//! | `Structured` object or array | `200`, `application/json`                  |
//! | anything else                | `200`, no headers, value as body           |

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde_json::Value;
use tessera_core::{Reply, Response, TesseraError, TesseraResult, View, ViewEngine};
use tracing::debug;

use crate::errors::ErrorHandler;

const VIEW_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A dispatch outcome: ready now, or once a deferred reply settles.
pub enum Dispatched {
    /// The final response.
    Ready(Response),
    /// A response that becomes available later.
    Deferred(BoxFuture<'static, TesseraResult<Response>>),
}

impl Dispatched {
    /// Waits for the final response.
    ///
    /// An error means the error handler declined to answer a failure.
    pub async fn into_response(self) -> TesseraResult<Response> {
        match self {
            Self::Ready(response) => Ok(response),
            Self::Deferred(future) => future.await,
        }
    }

    /// Returns `true` if the response is already available.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl std::fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(response) => f.debug_tuple("Ready").field(response).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Turns replies into responses.
#[derive(Clone)]
pub struct Normalizer {
    views: Arc<dyn ViewEngine>,
    errors: Arc<dyn ErrorHandler>,
    debug: bool,
}

impl Normalizer {
    /// Creates a normalizer rendering views with `views` and routing
    /// failures of deferred replies to `errors`.
    pub fn new(views: Arc<dyn ViewEngine>, errors: Arc<dyn ErrorHandler>, debug: bool) -> Self {
        Self {
            views,
            errors,
            debug,
        }
    }

    /// The error handler deferred failures are routed to.
    pub fn errors(&self) -> &Arc<dyn ErrorHandler> {
        &self.errors
    }

    /// Whether failures produce debug reports.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Normalizes `reply`.
    ///
    /// Synchronous failures (a view that fails to render, data that fails to
    /// encode) are returned for the caller to route; failures of a deferred
    /// reply are routed to the error handler once it settles.
    pub fn normalize(&self, reply: Reply) -> TesseraResult<Dispatched> {
        debug!(kind = reply.kind(), "normalizing reply");
        match reply {
            Reply::Deferred(future) => Ok(Dispatched::Deferred(self.clone().settle(future).boxed())),
            Reply::View(view) => self.render(view).map(Dispatched::Ready),
            Reply::Response(response) => Ok(Dispatched::Ready(response)),
            Reply::Structured(value @ (Value::Object(_) | Value::Array(_))) => {
                Response::json(&value, StatusCode::OK).map(Dispatched::Ready)
            }
            Reply::Structured(Value::String(text)) => {
                Ok(Dispatched::Ready(Response::new(StatusCode::OK, text)))
            }
            Reply::Structured(scalar) => Ok(Dispatched::Ready(Response::new(
                StatusCode::OK,
                scalar.to_string(),
            ))),
            Reply::Literal(body) => Ok(Dispatched::Ready(Response::new(StatusCode::OK, body))),
        }
    }

    async fn settle(self, future: BoxFuture<'static, TesseraResult<Reply>>) -> TesseraResult<Response> {
        let settled = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(panic_failure(panic.as_ref())),
        };

        match settled.and_then(|reply| self.normalize(reply)) {
            Ok(Dispatched::Ready(response)) => Ok(response),
            // already routed through the error handler by the inner settle
            Ok(Dispatched::Deferred(next)) => next.await,
            Err(error) => self.errors.handle(error, self.debug),
        }
    }

    fn render(&self, view: View) -> TesseraResult<Response> {
        let (template, data, status, headers) = view.into_parts();
        let body = self.views.render(&template, &data)?;

        let mut response = Response::new(status, body).with_headers(headers);
        if response.content_type().is_none() {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(VIEW_CONTENT_TYPE));
        }
        Ok(response)
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Converts a caught panic payload into a handler failure.
pub(crate) fn panic_failure(payload: &(dyn Any + Send)) -> TesseraError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    TesseraError::handler(anyhow::anyhow!("handler panicked: {message}"))
}
