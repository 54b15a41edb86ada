//! The per-request entry point: middleware pipeline, then dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tessera_core::{Request, Response, TesseraResult};
use tessera_middleware::Pipeline;

use crate::dispatcher::Dispatcher;

/// Runs requests through the middleware pipeline and into the dispatcher.
///
/// Cheap to clone; the transport hands a clone to every connection.
#[derive(Clone, Debug)]
pub struct Kernel {
    pipeline: Arc<Pipeline>,
    dispatcher: Arc<Dispatcher>,
}

impl Kernel {
    /// Creates a kernel.
    pub fn new(pipeline: Pipeline, dispatcher: Dispatcher) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// The middleware pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Produces the final response for `request`.
    ///
    /// Failures raised by middleware go to the error handler like any
    /// dispatch failure. An error is returned only when the error handler
    /// declines to answer.
    pub async fn handle(&self, request: Request) -> TesseraResult<Response> {
        let dispatcher = &*self.dispatcher;
        let declined = AtomicBool::new(false);
        let declined_ref = &declined;

        let result = self
            .pipeline
            .process(request, move |request| {
                Box::pin(async move {
                    let result = dispatcher.handle(request).await;
                    if result.is_err() {
                        declined_ref.store(true, Ordering::Relaxed);
                    }
                    result
                })
            })
            .await;

        match result {
            Err(error) if !declined.load(Ordering::Relaxed) => dispatcher.fail(error),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use http::{Method, StatusCode};
    use tessera_core::di::Container;
    use tessera_core::{
        HandlerRef, HandlerResult, IntoHandler, NoViews, PathParams, Reply, TesseraError,
    };
    use tessera_middleware::{FnMiddleware, JsonBodyParser};
    use tessera_router::RouteTable;

    use super::*;
    use crate::errors::ErrorHandler;
    use crate::normalize::Normalizer;

    struct Counting(Arc<AtomicUsize>);

    impl ErrorHandler for Counting {
        fn render(&self, _error: &TesseraError) -> Option<Response> {
            self.0.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    fn kernel(pipeline: Pipeline, renders: Arc<AtomicUsize>) -> Kernel {
        let mut routes: RouteTable<HandlerRef> = RouteTable::new();
        routes
            .post(
                "/echo",
                (|request: Request, _params: PathParams| -> HandlerResult {
                    Ok(Reply::from(request.parsed_body().cloned().unwrap_or_default()))
                })
                .into_handler(),
            )
            .get("/ghost", "Ghost@haunt".into_handler());

        let dispatcher = Dispatcher::new(
            Arc::new(Container::new()),
            Arc::new(routes),
            Normalizer::new(Arc::new(NoViews), Arc::new(Counting(renders)), false),
        );
        Kernel::new(pipeline, dispatcher)
    }

    #[tokio::test]
    async fn test_json_body_reaches_handler() {
        let pipeline = Pipeline::builder().stage(JsonBodyParser).build();
        let kernel = kernel(pipeline, Arc::default());

        let request = Request::new(Method::POST, "/echo")
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"Ada"}"#);
        let response = kernel.handle(request).await.unwrap();

        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(&response.body_bytes().unwrap()[..], br#"{"name":"Ada"}"#);
    }

    #[tokio::test]
    async fn test_middleware_abort_goes_to_error_handler() {
        let pipeline = Pipeline::builder()
            .stage(FnMiddleware::new("gate", |_request, _next| {
                Box::pin(async { Err(TesseraError::abort(401, "Unauthorized")) })
            }))
            .build();
        let kernel = kernel(pipeline, Arc::default());

        let response = kernel.handle(Request::new(Method::GET, "/ghost")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_declined_failure_is_handled_once() {
        let renders = Arc::new(AtomicUsize::new(0));
        let kernel = kernel(Pipeline::default(), Arc::clone(&renders));

        let error = kernel.handle(Request::new(Method::GET, "/ghost")).await.unwrap_err();
        assert!(matches!(error, TesseraError::Unresolvable(_)));
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }
}
