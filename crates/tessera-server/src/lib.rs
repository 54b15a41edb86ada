//! # Tessera Server
//!
//! Turns requests into responses and serves them over HTTP.
//!
//! - [`Dispatcher`] - routes a request, invokes its handler, normalizes the
//!   reply
//! - [`Normalizer`] - the per-shape rules turning a [`Reply`](tessera_core::Reply)
//!   into a [`Response`](tessera_core::Response)
//! - [`ErrorHandler`] - converts failures and control signals into responses
//! - [`Kernel`] - middleware pipeline followed by the dispatcher
//! - [`Server`] - hyper HTTP/1.1 transport with graceful shutdown
//! - [`TemplateViews`] - minijinja-backed view engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use tessera_core::{di::Container, NoViews};
//! use tessera_middleware::Pipeline;
//! use tessera_server::{DefaultErrorHandler, Dispatcher, Kernel, Normalizer, Server, ServerConfig};
//!
//! # async fn run(routes: tessera_router::RouteTable<tessera_core::HandlerRef>) -> Result<(), tessera_server::ServerError> {
//! let normalizer = Normalizer::new(Arc::new(NoViews), Arc::new(DefaultErrorHandler), false);
//! let dispatcher = Dispatcher::new(Arc::new(Container::new()), Arc::new(routes), normalizer);
//! let kernel = Kernel::new(Pipeline::default(), dispatcher);
//!
//! Server::bind(ServerConfig::default(), kernel).await?.serve().await
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatcher;
mod errors;
mod kernel;
mod normalize;
mod server;
mod shutdown;
mod views;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
pub use dispatcher::{Dispatcher, RouteResolver};
pub use errors::{DefaultErrorHandler, ErrorHandler};
pub use kernel::Kernel;
pub use normalize::{Dispatched, Normalizer};
pub use server::{into_http, HttpResponse, ResponseBody, Server, ServerError};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
pub use views::TemplateViews;
