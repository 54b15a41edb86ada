//! Ordered middleware pipeline.
//!
//! Stages run in registration order; the endpoint (normally the dispatcher)
//! runs last.

use std::sync::Arc;

use tessera_core::{Request, Response, TesseraResult};

use crate::middleware::{BoxFuture, Middleware, Next};

/// A boxed middleware stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The entry chain a request passes through before dispatch.
///
/// # Example
///
/// ```rust
/// use http::{Method, StatusCode};
/// use tessera_core::{Request, Response};
/// use tessera_middleware::{JsonBodyParser, Pipeline};
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder().stage(JsonBodyParser).build();
/// assert_eq!(pipeline.stage_names(), vec!["json_body"]);
///
/// let response = pipeline
///     .process(Request::new(Method::GET, "/"), |_request| {
///         Box::pin(async { Ok(Response::text(StatusCode::OK, "done")) })
///     })
///     .await
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a pipeline from stages in run order.
    pub fn new(stages: Vec<BoxedMiddleware>) -> Self {
        Self { stages }
    }

    /// Creates a pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Runs `request` through every stage, then `endpoint`.
    pub async fn process<'a, E>(&'a self, request: Request, endpoint: E) -> TesseraResult<Response>
    where
        E: FnOnce(Request) -> BoxFuture<'a, TesseraResult<Response>> + Send + 'a,
    {
        self.build_chain(endpoint).run(request).await
    }

    fn build_chain<'a, E>(&'a self, endpoint: E) -> Next<'a>
    where
        E: FnOnce(Request) -> BoxFuture<'a, TesseraResult<Response>> + Send + 'a,
    {
        self.stages
            .iter()
            .rev()
            .fold(Next::endpoint(endpoint), |next, stage| {
                Next::new(stage.as_ref(), next)
            })
    }

    /// Returns the names of all stages in run order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn shared(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.stages)
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use parking_lot::Mutex;

    use super::*;
    use crate::FnMiddleware;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, TesseraResult<Response>> {
            Box::pin(async move {
                self.log.lock().push(self.name);
                next.run(request).await
            })
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .stage(Recorder { name: "first", log: Arc::clone(&log) })
            .stage(Recorder { name: "second", log: Arc::clone(&log) })
            .build();

        let endpoint_log = Arc::clone(&log);
        let response = pipeline
            .process(Request::new(Method::GET, "/"), move |_request| {
                Box::pin(async move {
                    endpoint_log.lock().push("endpoint");
                    Ok(Response::ok())
                })
            })
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*log.lock(), vec!["first", "second", "endpoint"]);
        assert_eq!(pipeline.stage_names(), vec!["first", "second"]);
        assert_eq!(pipeline.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_pipeline_calls_endpoint() {
        let pipeline = Pipeline::default();
        assert!(pipeline.is_empty());

        let response = pipeline
            .process(Request::new(Method::GET, "/"), |_request| {
                Box::pin(async { Ok(Response::text(StatusCode::OK, "direct")) })
            })
            .await
            .unwrap();
        assert_eq!(&response.body_bytes().unwrap()[..], b"direct");
    }

    #[tokio::test]
    async fn test_short_circuit_skips_endpoint() {
        let pipeline = Pipeline::builder()
            .stage(FnMiddleware::new("deny", |_request, _next| {
                Box::pin(async { Ok(Response::text(StatusCode::UNAUTHORIZED, "denied")) })
            }))
            .build();

        let response = pipeline
            .process(Request::new(Method::GET, "/"), |_request| {
                Box::pin(async { panic!("endpoint must not run") })
            })
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
