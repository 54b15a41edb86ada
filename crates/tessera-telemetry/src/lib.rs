//! # Tessera Telemetry
//!
//! Structured logging for Tessera applications, built on `tracing` and
//! `tracing-subscriber`.
//!
//! Dispatch runs inside a `dispatch` span carrying `request_id`, `method`
//! and `path`, so every event logged while handling a request is
//! correlated with it.

#![doc(html_root_url = "https://docs.rs/tessera-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
