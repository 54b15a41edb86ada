//! # Tessera
//!
//! A request runtime built around a contextual dependency container.
//!
//! Routes point at closures or at controllers resolved from the container
//! by name. Whatever a handler returns (a response, a template view,
//! structured data, plain text or a future of any of these) is normalized
//! into an HTTP response, and failures are turned into responses by a
//! single error handler.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let mut app = Application::new(ConfigLoader::new().with_dotenv()?.load()?);
//!
//!     app.get("/users/{id}", |_request: Request, params: PathParams| -> HandlerResult {
//!         Reply::json(&serde_json::json!({"id": &params[0]}))
//!     });
//!     app.post("/users", "UserController@store");
//!
//!     app.run().await
//! }
//! ```
//!
//! ## Crates
//!
//! - [`core`] - container, request/response, replies, errors
//! - [`router`] - the route table
//! - [`middleware`] - the entry chain
//! - [`server`] - dispatcher, normalizer, error handler, transport
//! - [`config`] - configuration loading
//! - [`telemetry`] - log output

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod helpers;

pub use tessera_config as config;
pub use tessera_core as core;
pub use tessera_middleware as middleware;
pub use tessera_router as router;
pub use tessera_server as server;
pub use tessera_telemetry as telemetry;

pub use app::Application;
pub use error::AppError;
pub use helpers::{abort, abort_if, abort_json, abort_unless, dump, response, view};
pub use tessera_core::{
    HandlerResult, PathParams, Reply, Request, Response, TesseraError, TesseraResult, View,
};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        abort, abort_if, abort_json, abort_unless, dd, dump, response, view, AppError,
        Application,
    };

    pub use tessera_config::{AppConfig, ConfigLoader};
    pub use tessera_core::di::{Args, Container, Instance, Param, Target, TypeDescriptor};
    pub use tessera_core::{
        Controller, HandlerRef, HandlerResult, IntoHandler, PathParams, Reply, Request, Response,
        TesseraError, TesseraResult, View,
    };
    pub use tessera_middleware::{Middleware, Next};
    pub use tessera_server::ErrorHandler;
}
