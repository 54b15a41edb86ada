//! Route table for Tessera.
//!
//! The dispatcher treats routing as a black box that answers one question:
//! given a method and a path, is there a handler? This crate provides the
//! default answer, a registration-ordered [`RouteTable`] producing a
//! tri-state [`RouteMatch`].
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use tessera_router::RouteTable;
//!
//! let mut routes: RouteTable<&str> = RouteTable::new();
//! routes.get("/users/{id}", "show_user");
//!
//! let found = routes.match_route(&Method::GET, "/users/42");
//! assert!(found.is_found());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod params;
mod table;

pub use params::PathParams;
pub use table::{RouteMatch, RouteTable};
