//! Handler references and the controller contract.
//!
//! A route points at a [`HandlerRef`]: either a callable stored directly, or
//! a controller descriptor (`"UserController@show"`) naming a type to
//! resolve through the container and the action to invoke on it.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::di::Instance;
use crate::{HandlerResult, PathParams, Request};

/// A type-erased handler callable.
pub type HandlerFn = Arc<dyn Fn(Request, PathParams) -> HandlerResult + Send + Sync>;

/// A controller resolved from the container.
///
/// Both methods return `None` when the controller has no such action or no
/// direct call form; the dispatcher turns that into a not-invokable error.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Controller, HandlerResult, PathParams, Reply, Request};
///
/// struct UserController;
///
/// impl Controller for UserController {
///     fn call(&self, action: &str, _req: Request, params: PathParams) -> Option<HandlerResult> {
///         match action {
///             "show" => Some(Ok(Reply::from(format!("user {}", &params[0])))),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Invokes the named action.
    fn call(&self, action: &str, request: Request, params: PathParams) -> Option<HandlerResult> {
        let _ = (action, request, params);
        None
    }

    /// Invokes the controller itself, for routes that name no action.
    fn invoke(&self, request: Request, params: PathParams) -> Option<HandlerResult> {
        let _ = (request, params);
        None
    }
}

/// A shared, type-erased controller as stored in the container.
#[derive(Clone)]
pub struct ControllerHandle(Arc<dyn Controller>);

impl ControllerHandle {
    /// Wraps a controller.
    pub fn new<C: Controller>(controller: C) -> Self {
        Self(Arc::new(controller))
    }

    /// Extracts the controller from a resolved instance.
    pub fn from_instance(instance: &Instance) -> Option<Self> {
        instance
            .downcast_ref::<Self>()
            .cloned()
    }
}

impl Deref for ControllerHandle {
    type Target = dyn Controller;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ControllerHandle(..)")
    }
}

/// What a route invokes.
#[derive(Clone)]
pub enum HandlerRef {
    /// A callable invoked directly.
    Callable(HandlerFn),
    /// A controller resolved by name, with an optional action.
    Controller {
        /// The container name of the controller.
        type_name: String,
        /// The action to call; `None` invokes the controller directly.
        action: Option<String>,
    },
}

impl HandlerRef {
    /// Wraps a callable.
    pub fn callable<F>(handler: F) -> Self
    where
        F: Fn(Request, PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(handler))
    }

    /// Refers to `action` on the controller registered as `type_name`.
    pub fn controller(type_name: impl Into<String>, action: Option<&str>) -> Self {
        Self::Controller {
            type_name: type_name.into(),
            action: action.map(str::to_string),
        }
    }

    /// Parses a `Type@action` descriptor. A descriptor without `@`, or with
    /// an empty action, names the controller alone.
    ///
    /// ```rust
    /// use tessera_core::HandlerRef;
    ///
    /// let show = HandlerRef::parse("UserController@show");
    /// assert_eq!(show.to_string(), "UserController@show");
    ///
    /// let invokable = HandlerRef::parse("HealthCheck");
    /// assert_eq!(invokable.to_string(), "HealthCheck");
    /// ```
    pub fn parse(descriptor: &str) -> Self {
        match descriptor.split_once('@') {
            Some((type_name, action)) if !action.is_empty() => {
                Self::controller(type_name, Some(action))
            }
            Some((type_name, _)) => Self::controller(type_name, None),
            None => Self::controller(descriptor, None),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("<callable>"),
            Self::Controller {
                type_name,
                action: Some(action),
            } => write!(f, "{type_name}@{action}"),
            Self::Controller { type_name, .. } => f.write_str(type_name),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerRef({self})")
    }
}

/// Conversion into a [`HandlerRef`].
///
/// Implemented for closures `Fn(Request, PathParams) -> HandlerResult`,
/// `"Type@action"` strings and `(type, action)` pairs.
pub trait IntoHandler {
    /// Performs the conversion.
    fn into_handler(self) -> HandlerRef;
}

impl IntoHandler for HandlerRef {
    fn into_handler(self) -> HandlerRef {
        self
    }
}

impl<F> IntoHandler for F
where
    F: Fn(Request, PathParams) -> HandlerResult + Send + Sync + 'static,
{
    fn into_handler(self) -> HandlerRef {
        HandlerRef::callable(self)
    }
}

impl IntoHandler for &str {
    fn into_handler(self) -> HandlerRef {
        HandlerRef::parse(self)
    }
}

impl IntoHandler for String {
    fn into_handler(self) -> HandlerRef {
        HandlerRef::parse(&self)
    }
}

impl IntoHandler for (&str, &str) {
    fn into_handler(self) -> HandlerRef {
        HandlerRef::controller(self.0, Some(self.1))
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::Reply;

    struct Greeter;

    impl Controller for Greeter {
        fn call(&self, action: &str, _request: Request, params: PathParams) -> Option<HandlerResult> {
            (action == "hello").then(|| Ok(Reply::from(format!("hello {}", &params[0]))))
        }
    }

    #[test]
    fn test_parse_descriptors() {
        assert!(matches!(
            HandlerRef::parse("UserController@show"),
            HandlerRef::Controller { ref type_name, action: Some(ref a) } if type_name == "UserController" && a == "show"
        ));
        assert!(matches!(
            HandlerRef::parse("Invokable"),
            HandlerRef::Controller { action: None, .. }
        ));
        assert!(matches!(
            HandlerRef::parse("Trailing@"),
            HandlerRef::Controller { action: None, .. }
        ));
    }

    #[test]
    fn test_into_handler_variants() {
        assert_eq!(("Users", "index").into_handler().to_string(), "Users@index");
        assert_eq!(String::from("Users@show").into_handler().to_string(), "Users@show");

        let closure = |_req: Request, _params: PathParams| -> HandlerResult { Ok(Reply::from("ok")) };
        assert_eq!(closure.into_handler().to_string(), "<callable>");
    }

    #[test]
    fn test_controller_handle_roundtrip() {
        let instance = Instance::new(ControllerHandle::new(Greeter));
        let handle = ControllerHandle::from_instance(&instance).unwrap();

        let params: PathParams = [("name", "ada")].into_iter().collect();
        let reply = handle
            .call("hello", Request::new(Method::GET, "/"), params.clone())
            .unwrap()
            .unwrap();
        assert_eq!(reply.kind(), "literal");

        assert!(handle.call("bye", Request::new(Method::GET, "/"), params.clone()).is_none());
        assert!(handle.invoke(Request::new(Method::GET, "/"), params).is_none());
    }

    #[test]
    fn test_plain_instance_is_not_a_controller() {
        assert!(ControllerHandle::from_instance(&Instance::new(5_u8)).is_none());
    }
}
