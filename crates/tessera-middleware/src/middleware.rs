//! Core middleware trait and types.
//!
//! Middleware wraps the dispatcher: each stage receives the request and a
//! [`Next`] continuation, may transform the request, and decides whether to
//! call the rest of the chain.
//!
//! # Example
//!
//! ```rust
//! use tessera_core::{Request, Response, TesseraResult};
//! use tessera_middleware::{BoxFuture, Middleware, Next};
//!
//! struct TagRequests;
//!
//! impl Middleware for TagRequests {
//!     fn name(&self) -> &'static str {
//!         "tag"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, TesseraResult<Response>> {
//!         Box::pin(async move {
//!             let request = request.with_header("x-tagged", "1");
//!             next.run(request).await
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use tessera_core::{Request, Response, TesseraResult};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A stage in the entry chain.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware for logging.
    fn name(&self) -> &'static str;

    /// Processes a request.
    ///
    /// Call `next.run(request)` to continue down the chain, or return a
    /// response directly to short-circuit it.
    fn process<'a>(&'a self, request: Request, next: Next<'a>)
        -> BoxFuture<'a, TesseraResult<Response>>;
}

/// The remainder of the chain, ending at the endpoint.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

type Endpoint<'a> = Box<dyn FnOnce(Request) -> BoxFuture<'a, TesseraResult<Response>> + Send + 'a>;

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Endpoint(Endpoint<'a>),
}

impl<'a> Next<'a> {
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates the terminal continuation.
    pub fn endpoint<F>(f: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'a, TesseraResult<Response>> + Send + 'a,
    {
        Self {
            inner: NextInner::Endpoint(Box::new(f)),
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, request: Request) -> TesseraResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next).await,
            NextInner::Endpoint(endpoint) => endpoint(request).await,
        }
    }
}

/// A middleware built from a closure.
///
/// ```rust
/// use tessera_middleware::FnMiddleware;
///
/// let passthrough = FnMiddleware::new("passthrough", |request, next| {
///     Box::pin(async move { next.run(request).await })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, TesseraResult<Response>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a named closure middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, TesseraResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, TesseraResult<Response>> {
        (self.func)(request, next)
    }
}
