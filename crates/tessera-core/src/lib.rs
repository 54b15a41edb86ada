//! # Tessera Core
//!
//! Core types and contracts for the Tessera request runtime.
//!
//! - [`di`] - contextual dependency container ([`di::Container`])
//! - [`Request`] / [`Response`] - the values flowing through dispatch
//! - [`Reply`] - the closed set of shapes a handler may return
//! - [`View`] / [`ViewEngine`] - deferred template rendering
//! - [`HandlerRef`] / [`Controller`] - what a route points at
//! - [`TesseraError`] - the failure type, including the abort and dump
//!   control signals

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod di;
mod error;
mod handler;
mod reply;
mod request;
mod response;
mod view;

pub use error::{TesseraError, TesseraResult};
pub use handler::{Controller, ControllerHandle, HandlerFn, HandlerRef, IntoHandler};
pub use reply::{HandlerResult, Reply};
pub use request::{Request, RequestId};
pub use response::{Body, BodyStream, BoxError, Response};
pub use tessera_router::PathParams;
pub use view::{NoViews, View, ViewEngine, ViewError};
