//! Startup failures.

use thiserror::Error;

/// Failures that stop [`Application::run`](crate::Application::run).
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] tessera_config::ConfigError),

    /// Log output could not be set up.
    #[error(transparent)]
    Telemetry(#[from] tessera_telemetry::TelemetryError),

    /// The transport failed to bind or serve.
    #[error(transparent)]
    Server(#[from] tessera_server::ServerError),
}
