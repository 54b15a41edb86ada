//! Failure-to-response conversion.
//!
//! Every failure raised while dispatching ends up here. Control signals are
//! always answered; everything else goes to [`ErrorHandler::render`] first,
//! then to the debug report, and is re-raised to the transport otherwise.

use std::backtrace::BacktraceStatus;
use std::error::Error as _;
use std::fmt::Write as _;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde_json::Value;
use tessera_core::{Response, TesseraError, TesseraResult};
use tracing::error;

/// Converts dispatch failures into responses.
///
/// Applications override [`render`](Self::render) to answer their own
/// failures; `handle` is not meant to be overridden.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use tessera_core::{Response, TesseraError};
/// use tessera_server::ErrorHandler;
///
/// struct Friendly;
///
/// impl ErrorHandler for Friendly {
///     fn render(&self, error: &TesseraError) -> Option<Response> {
///         matches!(error, TesseraError::Unresolvable(_))
///             .then(|| Response::text(StatusCode::SERVICE_UNAVAILABLE, "try again later"))
///     }
/// }
/// ```
pub trait ErrorHandler: Send + Sync + 'static {
    /// Returns a response for `error`, or `None` to fall through.
    fn render(&self, error: &TesseraError) -> Option<Response> {
        let _ = error;
        None
    }

    /// Answers `error`, or hands it back when nothing answers it.
    fn handle(&self, error: TesseraError, debug: bool) -> TesseraResult<Response> {
        match error {
            TesseraError::Dump(output) => Ok(Response::text(StatusCode::OK, output)),
            TesseraError::Abort { status, message } => Ok(abort_response(status, message)),
            error => {
                if let Some(response) = self.render(&error) {
                    return Ok(response);
                }
                if debug {
                    error!(error = %error, "unhandled failure");
                    return Ok(Response::text(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        debug_report(&error),
                    ));
                }
                Err(error)
            }
        }
    }
}

/// Renders nothing; only control signals and the debug report apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {}

/// Builds the response for an abort.
///
/// The message is labelled `application/json` only when it parses as a JSON
/// object or array, empty ones included. JSON scalars such as `42`, `true`
/// or `"text"` are sent as `text/plain`.
fn abort_response(status: u16, message: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = if is_json_document(&message) {
        "application/json"
    } else {
        "text/plain"
    };
    Response::new(status, message).with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
}

fn is_json_document(message: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(message),
        Ok(Value::Object(_) | Value::Array(_))
    )
}

/// The failure message, its cause chain and any captured backtrace.
fn debug_report(error: &TesseraError) -> String {
    let mut report = error.to_string();

    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(report, "\n\nCaused by: {cause}");
        source = cause.source();
    }

    if let Some(backtrace) = error.backtrace() {
        if backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(report, "\n\nStack backtrace:\n{backtrace}");
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_json::json;

    use super::*;

    fn body(response: &Response) -> String {
        String::from_utf8(response.body_bytes().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_dump_is_plain_ok() {
        let response = DefaultErrorHandler
            .handle(TesseraError::Dump("[1, 2]".into()), false)
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(body(&response), "[1, 2]");
    }

    #[test]
    fn test_abort_text_and_json() {
        let text = DefaultErrorHandler
            .handle(TesseraError::abort(403, "Forbidden"), false)
            .unwrap();
        assert_eq!(text.status(), StatusCode::FORBIDDEN);
        assert_eq!(text.content_type(), Some("text/plain"));

        let json = DefaultErrorHandler
            .handle(TesseraError::abort(422, json!({"field": "required"}).to_string()), false)
            .unwrap();
        assert_eq!(json.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json.content_type(), Some("application/json"));
    }

    #[test]
    fn test_abort_scalar_json_stays_text() {
        let response = DefaultErrorHandler
            .handle(TesseraError::abort(400, "42"), false)
            .unwrap();
        assert_eq!(response.content_type(), Some("text/plain"));

        for scalar in ["true", "null", r#""quoted""#] {
            let response = DefaultErrorHandler
                .handle(TesseraError::abort(400, scalar), false)
                .unwrap();
            assert_eq!(response.content_type(), Some("text/plain"));
        }
    }

    #[test]
    fn test_abort_empty_json_containers_are_json() {
        for body in ["[]", "{}"] {
            let response = DefaultErrorHandler
                .handle(TesseraError::abort(422, body), false)
                .unwrap();
            assert_eq!(response.content_type(), Some("application/json"));
        }
    }

    #[test]
    fn test_abort_invalid_status_becomes_500() {
        for status in [0, 42, 1000] {
            let response = DefaultErrorHandler
                .handle(TesseraError::abort(status, "oops"), false)
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_unhandled_failure_is_reraised_without_debug() {
        let error = DefaultErrorHandler
            .handle(TesseraError::Routing("table missing".into()), false)
            .unwrap_err();
        assert!(matches!(error, TesseraError::Routing(_)));
    }

    #[test]
    fn test_debug_report_includes_cause_chain() {
        let failure = Err::<(), _>(std::io::Error::other("disk full"))
            .context("saving avatar")
            .unwrap_err();
        let response = DefaultErrorHandler
            .handle(TesseraError::handler(failure), true)
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = body(&response);
        assert!(report.starts_with("saving avatar"));
        assert!(report.contains("Caused by: disk full"));
    }

    #[test]
    fn test_render_hook_takes_precedence() {
        struct Teapot;

        impl ErrorHandler for Teapot {
            fn render(&self, _error: &TesseraError) -> Option<Response> {
                Some(Response::text(StatusCode::IM_A_TEAPOT, "short and stout"))
            }
        }

        let response = Teapot
            .handle(TesseraError::Routing("broken".into()), false)
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

        let abort = Teapot.handle(TesseraError::abort(401, "who?"), false).unwrap();
        assert_eq!(abort.status(), StatusCode::UNAUTHORIZED);
    }
}
