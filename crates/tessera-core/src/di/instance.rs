//! Type-erased resolved values.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use super::ResolveError;

/// A value produced by the container.
///
/// Instances are reference counted: cloning one shares the underlying value,
/// which is what makes cached singletons identity-equal across resolutions.
/// An instance may carry the *singleton capability*, meaning it asks to be
/// cached process-wide even when no explicit singleton binding exists.
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    singleton: bool,
}

impl Instance {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without re-allocating.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
            singleton: false,
        }
    }

    /// Wraps a value that declares the singleton capability.
    pub fn singleton<T: Any + Send + Sync>(value: T) -> Self {
        Self::new(value).into_singleton()
    }

    /// Marks this instance with the singleton capability.
    #[must_use]
    pub fn into_singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Returns `true` if the instance declares the singleton capability.
    pub fn declares_singleton(&self) -> bool {
        self.singleton
    }

    /// Returns the Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Returns the wrapped value as `Arc<T>`, or `None` on type mismatch.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Borrows the wrapped value as `&T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns the wrapped value as `Arc<T>`, failing with
    /// [`ResolveError::TypeMismatch`] naming `name`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        self.downcast::<T>().ok_or_else(|| ResolveError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
            found: self.type_name,
        })
    }

    /// Returns `true` if both instances share the same underlying value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name)
            .field("singleton", &self.singleton)
            .finish()
    }
}
