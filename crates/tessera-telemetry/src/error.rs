//! Telemetry error types.

use thiserror::Error;

/// Errors raised while setting up log output.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level string is not a valid filter directive.
    #[error("invalid log filter `{directive}`")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Why it was rejected.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    LoggingInit(String),
}
