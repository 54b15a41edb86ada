//! Request dispatch.
//!
//! The dispatcher asks the route provider for a match, invokes the handler
//! (directly for callables, through the container for controllers), and
//! normalizes what the handler returns. Every failure on the way is handed
//! to the error handler.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;
use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use tessera_core::di::Container;
use tessera_core::{
    ControllerHandle, HandlerRef, HandlerResult, PathParams, Request, Response, TesseraError,
    TesseraResult,
};
use tessera_router::{RouteMatch, RouteTable};
use tracing::{debug, info_span, Instrument};

use crate::normalize::{panic_failure, Dispatched, Normalizer};

/// Looks up the handler for a request.
pub trait RouteResolver: Send + Sync + 'static {
    /// Matches `method` and `path`. An error is reported as a routing
    /// failure.
    fn resolve(&self, method: &Method, path: &str) -> TesseraResult<RouteMatch<HandlerRef>>;
}

impl RouteResolver for RouteTable<HandlerRef> {
    fn resolve(&self, method: &Method, path: &str) -> TesseraResult<RouteMatch<HandlerRef>> {
        Ok(self.match_route(method, path))
    }
}

/// Routes requests to handlers and produces their responses.
pub struct Dispatcher {
    container: Arc<Container>,
    routes: Arc<dyn RouteResolver>,
    normalizer: Normalizer,
}

impl Dispatcher {
    /// Creates a dispatcher resolving controllers from `container`.
    pub fn new(container: Arc<Container>, routes: Arc<dyn RouteResolver>, normalizer: Normalizer) -> Self {
        Self {
            container,
            routes,
            normalizer,
        }
    }

    /// The container controllers are resolved from.
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// The normalizer applied to handler replies.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Dispatches `request`.
    ///
    /// Returns an error only when the error handler declines to answer a
    /// failure.
    pub fn dispatch(&self, request: Request) -> TesseraResult<Dispatched> {
        let span = info_span!(
            "dispatch",
            request_id = %request.id(),
            method = %request.method(),
            path = request.path(),
        );
        let _entered = span.enter();

        match self.route(request) {
            Ok(Dispatched::Deferred(future)) => {
                Ok(Dispatched::Deferred(future.instrument(span.clone()).boxed()))
            }
            Ok(ready) => Ok(ready),
            Err(error) => self.fail(error).map(Dispatched::Ready),
        }
    }

    /// Dispatches `request` and waits for the final response.
    pub async fn handle(&self, request: Request) -> TesseraResult<Response> {
        self.dispatch(request)?.into_response().await
    }

    /// Hands `error` to the error handler.
    pub fn fail(&self, error: TesseraError) -> TesseraResult<Response> {
        self.normalizer.errors().handle(error, self.normalizer.debug())
    }

    fn route(&self, request: Request) -> TesseraResult<Dispatched> {
        match self.routes.resolve(request.method(), request.path())? {
            RouteMatch::NotFound => {
                debug!("no route matched");
                Ok(Dispatched::Ready(Response::text(StatusCode::NOT_FOUND, "Not found")))
            }
            RouteMatch::MethodNotAllowed { allowed } => {
                debug!(?allowed, "method not allowed");
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let allow = HeaderValue::from_str(&allow).map_err(http::Error::from)?;
                Ok(Dispatched::Ready(
                    Response::text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
                        .with_header(ALLOW, allow),
                ))
            }
            RouteMatch::Found { handler, params } => {
                debug!(%handler, params = params.len(), "route matched");
                let reply = self.invoke(&handler, request, params)?;
                self.normalizer.normalize(reply)
            }
        }
    }

    fn invoke(&self, handler: &HandlerRef, request: Request, params: PathParams) -> HandlerResult {
        match handler {
            HandlerRef::Callable(callable) => guarded(|| callable(request, params))?,
            HandlerRef::Controller { type_name, action } => {
                let not_invokable = || TesseraError::NotInvokable {
                    type_name: type_name.clone(),
                    action: action.clone(),
                };

                let instance = self.container.resolve(type_name, None)?;
                let controller = ControllerHandle::from_instance(&instance).ok_or_else(not_invokable)?;
                let outcome = match action.as_deref() {
                    Some(action) => guarded(|| controller.call(action, request, params))?,
                    None => guarded(|| controller.invoke(request, params))?,
                };
                outcome.ok_or_else(not_invokable)?
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("container", &self.container)
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

fn guarded<T>(f: impl FnOnce() -> T) -> TesseraResult<T> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|panic| panic_failure(panic.as_ref()))
}
