//! Binding registry.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::{Container, Instance, ResolveError};

/// Closure producing an instance, given the container.
pub type Factory = Arc<dyn Fn(&Container) -> Result<Instance, ResolveError> + Send + Sync>;

/// What a binding key resolves to.
#[derive(Clone)]
pub enum Target {
    /// Another logical name, resolved recursively.
    Name(String),
    /// A factory invoked with the container as its only argument.
    Factory(Factory),
    /// A literal value returned as is.
    Value(Instance),
}

impl Target {
    /// Creates a factory target from a closure returning a plain value.
    pub fn factory<F, T>(factory: F) -> Self
    where
        F: Fn(&Container) -> Result<T, ResolveError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self::Factory(Arc::new(move |container| factory(container).map(Instance::new)))
    }

    /// Creates a factory target from a closure that builds the [`Instance`]
    /// itself, e.g. to declare the singleton capability.
    pub fn factory_instance<F>(factory: F) -> Self
    where
        F: Fn(&Container) -> Result<Instance, ResolveError> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    /// Creates a literal target.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::Value(Instance::new(value))
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Instance> for Target {
    fn from(instance: Instance) -> Self {
        Self::Value(instance)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Value(instance) => f.debug_tuple("Value").field(instance).finish(),
        }
    }
}

/// Builds the registry key for `name`, optionally scoped to a consumer.
///
/// ```rust
/// use tessera_core::di::binding_key;
///
/// assert_eq!(binding_key("Logger", None), "Logger");
/// assert_eq!(binding_key("Logger", Some("Mailer")), "Logger::Mailer");
/// ```
#[must_use]
pub fn binding_key(name: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!("{name}::{context}"),
        None => name.to_string(),
    }
}

/// Targets and singleton flags, keyed by binding key.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    targets: HashMap<String, Target>,
    singletons: HashSet<String>,
}

impl Bindings {
    /// Registers `target` under `key`. Marking a key singleton is sticky: a
    /// later plain binding replaces the target but keeps the flag.
    pub(crate) fn insert(&mut self, key: String, target: Target, singleton: bool) {
        if singleton {
            self.singletons.insert(key.clone());
        }
        self.targets.insert(key, target);
    }

    pub(crate) fn get(&self, key: &str) -> Option<Target> {
        self.targets.get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.targets.contains_key(key)
    }

    pub(crate) fn is_singleton(&self, key: &str) -> bool {
        self.singletons.contains(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_format() {
        assert_eq!(binding_key("Cache", Some("Reports")), "Cache::Reports");
        assert_eq!(binding_key("Cache", None), "Cache");
    }

    #[test]
    fn test_singleton_flag_survives_rebinding() {
        let mut bindings = Bindings::default();
        bindings.insert("Logger".into(), Target::from("FileLogger"), true);
        bindings.insert("Logger".into(), Target::from("NullLogger"), false);

        assert!(bindings.is_singleton("Logger"));
        assert!(matches!(bindings.get("Logger"), Some(Target::Name(n)) if n == "NullLogger"));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_target_conversions() {
        assert!(matches!(Target::from("Db"), Target::Name(_)));
        assert!(matches!(Target::from(String::from("Db")), Target::Name(_)));
        assert!(matches!(Target::value(5_u32), Target::Value(_)));
        assert_eq!(format!("{:?}", Target::factory(|_| Ok(1_u8))), "Factory(..)");
    }
}
