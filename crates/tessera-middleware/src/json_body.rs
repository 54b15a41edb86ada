//! JSON request body parsing.

use tessera_core::{Request, Response, TesseraResult};
use tracing::warn;

use crate::middleware::{BoxFuture, Middleware, Next};

/// Parses `application/json` bodies into the request's parsed-body slot.
///
/// The content type is compared case-insensitively with any parameters
/// (`; charset=utf-8`) stripped. A body that is not valid JSON leaves the
/// slot empty; the request still continues down the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyParser;

impl JsonBodyParser {
    fn is_json(request: &Request) -> bool {
        request
            .content_type()
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
    }

    fn parse(mut request: Request) -> Request {
        match serde_json::from_slice(request.body()) {
            Ok(value) => request.set_parsed_body(value),
            Err(err) => warn!(
                request_id = %request.id(),
                error = %err,
                "ignoring malformed JSON body"
            ),
        }
        request
    }
}

impl Middleware for JsonBodyParser {
    fn name(&self) -> &'static str {
        "json_body"
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, TesseraResult<Response>> {
        let request = if Self::is_json(&request) {
            Self::parse(request)
        } else {
            request
        };
        Box::pin(next.run(request))
    }
}
