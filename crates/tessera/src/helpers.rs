//! Shortcuts for handler bodies.

use std::fmt::{self, Write as _};

use serde::Serialize;
use tessera_core::{HandlerResult, Reply, Response, TesseraError, TesseraResult, View};

/// A template reply. `data` must serialize to a mapping or to `null`;
/// anything else is a handler failure.
///
/// ```rust
/// use serde_json::json;
/// use tessera::{view, Reply};
///
/// let reply = view("users/show", json!({"name": "Ada"})).unwrap();
/// assert!(matches!(reply, Reply::View(_)));
/// ```
pub fn view(template: impl Into<String>, data: impl Serialize) -> HandlerResult {
    Ok(Reply::View(View::new(template).with_data(data)?))
}

/// An empty `200` response to build on.
pub fn response() -> Response {
    Response::ok()
}

/// The abort signal: the request ends with `status` and `message` as the
/// body. Invalid status codes are answered with 500.
///
/// ```rust
/// use tessera::{abort, HandlerResult};
///
/// fn show(id: u64) -> HandlerResult {
///     if id == 0 {
///         return Err(abort(404, "no such user"));
///     }
///     Ok("found".into())
/// }
/// # assert!(show(0).is_err());
/// ```
pub fn abort(status: u16, message: impl Into<String>) -> TesseraError {
    TesseraError::abort(status, message)
}

/// The abort signal with a JSON body.
pub fn abort_json<T: Serialize + ?Sized>(status: u16, value: &T) -> TesseraError {
    match serde_json::to_string(value) {
        Ok(body) => TesseraError::abort(status, body),
        Err(err) => err.into(),
    }
}

/// Aborts when `condition` holds.
pub fn abort_if(condition: bool, status: u16, message: impl Into<String>) -> TesseraResult<()> {
    if condition {
        return Err(abort(status, message));
    }
    Ok(())
}

/// Aborts unless `condition` holds.
pub fn abort_unless(condition: bool, status: u16, message: impl Into<String>) -> TesseraResult<()> {
    abort_if(!condition, status, message)
}

/// The dump signal carrying the pretty `Debug` output of `values`, one per
/// block. The error handler answers it with a `200 text/plain`.
pub fn dump(values: &[&dyn fmt::Debug]) -> TesseraError {
    let mut output = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let _ = writeln!(output, "{value:#?}");
    }
    TesseraError::Dump(output)
}

/// Dumps the given values and ends the request.
///
/// Expands to an early `return Err(..)`, so it can only be used in
/// functions returning a `Result` whose error converts from
/// [`TesseraError`].
///
/// ```rust
/// use tessera::{dd, HandlerResult};
///
/// fn inspect(ids: Vec<u32>) -> HandlerResult {
///     dd!(ids, "checkpoint");
/// }
/// # assert!(inspect(vec![1]).is_err());
/// ```
#[macro_export]
macro_rules! dd {
    ($($value:expr),* $(,)?) => {
        return ::core::result::Result::Err(
            $crate::dump(&[$(&$value as &dyn ::core::fmt::Debug),*]).into()
        )
    };
}
