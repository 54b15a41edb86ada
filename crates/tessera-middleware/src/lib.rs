//! # Tessera Middleware
//!
//! The entry chain requests pass through before dispatch.
//!
//! - [`Middleware`] / [`Next`] - the `(request, next)` stage contract
//! - [`Pipeline`] - an ordered list of stages ending at an endpoint
//! - [`JsonBodyParser`] - parses JSON bodies into the request
//! - [`FnMiddleware`] - a stage built from a closure

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod json_body;
mod middleware;
mod pipeline;

pub use json_body::JsonBodyParser;
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
