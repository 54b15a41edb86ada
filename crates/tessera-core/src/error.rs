//! Error types for Tessera.
//!
//! [`TesseraError`] is the single failure type flowing through dispatch. Two
//! of its variants are not bugs but control signals: [`TesseraError::Abort`]
//! short-circuits a request with a chosen status, and [`TesseraError::Dump`]
//! halts it to show diagnostic output. Both are answered unconditionally by
//! the error handler.

use std::backtrace::Backtrace;

use thiserror::Error;

use crate::di::ResolveError;
use crate::view::ViewError;

/// Result type alias using [`TesseraError`].
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Failures raised while dispatching a request.
#[derive(Error, Debug)]
pub enum TesseraError {
    /// A handler, controller or one of its dependencies could not be resolved.
    #[error(transparent)]
    Unresolvable(#[from] ResolveError),

    /// A resolved controller has no usable action or call form.
    #[error("{}", not_invokable_message(.type_name, .action.as_deref()))]
    NotInvokable {
        /// The controller name.
        type_name: String,
        /// The requested action, if any.
        action: Option<String>,
    },

    /// The route provider failed.
    #[error("routing failed: {0}")]
    Routing(String),

    /// Application code failed.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// A view could not be rendered.
    #[error(transparent)]
    View(#[from] ViewError),

    /// An invalid status, header or response was built.
    #[error("invalid response: {0}")]
    Http(#[from] http::Error),

    /// Control signal: answer immediately with `status` and `message`.
    #[error("aborted with status {status}")]
    Abort {
        /// Requested status code. Invalid codes become 500.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Control signal: halt and show the given diagnostic output.
    #[error("dump")]
    Dump(String),
}

fn not_invokable_message(type_name: &str, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("`{type_name}` has no invokable action `{action}`"),
        None => format!("`{type_name}` is not invokable"),
    }
}

impl TesseraError {
    /// Wraps an application failure.
    pub fn handler(error: impl Into<anyhow::Error>) -> Self {
        Self::Handler(error.into())
    }

    /// Creates the abort control signal.
    pub fn abort(status: u16, message: impl Into<String>) -> Self {
        Self::Abort {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` for [`TesseraError::Abort`] and [`TesseraError::Dump`].
    #[must_use]
    pub const fn is_control_signal(&self) -> bool {
        matches!(self, Self::Abort { .. } | Self::Dump(_))
    }

    /// Returns the captured backtrace of an application failure, if any.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Self::Handler(err) => Some(err.backtrace()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for TesseraError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(err) => Self::Handler(err),
        }
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Handler(err.into())
    }
}
