//! Type declarations.
//!
//! A [`TypeDescriptor`] is the container's view of a constructible type: its
//! name, its ordered constructor parameters and a build closure receiving the
//! resolved arguments positionally. Interface declarations have no build
//! closure and can only be satisfied through a binding.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::{Instance, ResolveError};
use crate::handler::{Controller, ControllerHandle};

type Build = Arc<dyn Fn(&Args<'_>) -> Result<Instance, ResolveError> + Send + Sync>;

/// The declared type of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// A nominal type, resolved through the container.
    Named(String),
    /// A built-in type such as `int` or `string`; never resolved by name.
    Builtin(&'static str),
    /// A union of types; never resolved by name.
    Union(Vec<String>),
    /// No declared type.
    Untyped,
}

/// A constructor parameter.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Instance>,
}

impl Param {
    /// A parameter resolved through the container by type name.
    pub fn named(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::Named(type_name.into()))
    }

    /// A parameter of a built-in type.
    pub fn builtin(name: impl Into<String>, type_name: &'static str) -> Self {
        Self::with_kind(name, ParamKind::Builtin(type_name))
    }

    /// A parameter typed as a union.
    pub fn union<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            name,
            ParamKind::Union(members.into_iter().map(Into::into).collect()),
        )
    }

    /// A parameter with no declared type.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParamKind::Untyped)
    }

    fn with_kind(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Sets the value used when the parameter cannot be supplied.
    #[must_use]
    pub fn default_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.default = Some(Instance::new(value));
        self
    }

    /// Sets a pre-built default instance.
    #[must_use]
    pub fn default_instance(mut self, instance: Instance) -> Self {
        self.default = Some(instance);
        self
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// The default value, if any.
    pub fn default(&self) -> Option<&Instance> {
        self.default.as_ref()
    }
}

/// Resolved constructor arguments, in declaration order.
pub struct Args<'a> {
    owner: &'a str,
    params: &'a [Param],
    values: Vec<Instance>,
}

impl<'a> Args<'a> {
    pub(crate) fn new(owner: &'a str, params: &'a [Param], values: Vec<Instance>) -> Self {
        Self {
            owner,
            params,
            values,
        }
    }

    /// Returns the argument at `index` as `Arc<T>`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, ResolveError> {
        let instance = self.instance(index)?;
        let name = self.params.get(index).map_or(self.owner, Param::name);
        instance.get::<T>(name)
    }

    /// Returns a clone of the argument at `index`.
    pub fn value<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T, ResolveError> {
        self.get::<T>(index).map(|arc| (*arc).clone())
    }

    /// Returns the raw instance at `index`.
    pub fn instance(&self, index: usize) -> Result<&Instance, ResolveError> {
        self.values.get(index).ok_or_else(|| ResolveError::MissingArgument {
            owner: self.owner.to_string(),
            index,
        })
    }

    /// The number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a parameterless constructor.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A constructible type or an interface known to the container.
///
/// # Example
///
/// ```rust
/// use tessera_core::di::{Container, Param, TypeDescriptor};
///
/// struct Paginator {
///     per_page: u32,
/// }
///
/// let container = Container::new();
/// container.declare(
///     TypeDescriptor::concrete("Paginator", |args| {
///         Ok(Paginator { per_page: args.value(0)? })
///     })
///     .param(Param::builtin("per_page", "int").default_value(15_u32)),
/// );
///
/// let paginator = container.make::<Paginator>("Paginator").unwrap();
/// assert_eq!(paginator.per_page, 15);
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    params: Vec<Param>,
    build: Option<Build>,
    singleton: bool,
}

impl TypeDescriptor {
    /// Declares a concrete type built from its resolved arguments.
    pub fn concrete<F, T>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<T, ResolveError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self::from_build(name, Arc::new(move |args| build(args).map(Instance::new)))
    }

    /// Declares a controller type.
    ///
    /// The built value is stored as a [`ControllerHandle`] so the dispatcher
    /// can invoke its actions without knowing the concrete type.
    pub fn controller<F, C>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<C, ResolveError> + Send + Sync + 'static,
        C: Controller,
    {
        Self::from_build(
            name,
            Arc::new(move |args| build(args).map(|c| Instance::new(ControllerHandle::new(c)))),
        )
    }

    /// Declares an interface. Interfaces are never constructed; they resolve
    /// only through a binding.
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            build: None,
            singleton: false,
        }
    }

    fn from_build(name: impl Into<String>, build: Build) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            build: Some(build),
            singleton: false,
        }
    }

    /// Appends a constructor parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Declares the singleton capability: built instances are cached
    /// process-wide unless an explicit binding exists for the key.
    #[must_use]
    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constructor parameters in declaration order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns `true` for interface declarations.
    pub fn is_interface(&self) -> bool {
        self.build.is_none()
    }

    /// Returns `true` if the type declares the singleton capability.
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    pub(crate) fn build(&self, args: &Args<'_>) -> Result<Instance, ResolveError> {
        let build = self.build.as_ref().ok_or_else(|| ResolveError::Interface {
            name: self.name.clone(),
        })?;
        let instance = build(args)?;
        Ok(if self.singleton {
            instance.into_singleton()
        } else {
            instance
        })
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("interface", &self.is_interface())
            .field("singleton", &self.singleton)
            .finish()
    }
}
