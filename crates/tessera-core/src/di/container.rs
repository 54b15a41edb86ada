//! The resolver.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::binding::{binding_key, Bindings, Target};
use super::descriptor::{Args, Param, ParamKind, TypeDescriptor};
use super::{Instance, ResolveError};

thread_local! {
    static RESOLVING: RefCell<Vec<(String, Option<String>)>> = const { RefCell::new(Vec::new()) };
}

/// Tracks `(name, context)` pairs being resolved on this thread so that a
/// cyclic graph fails instead of overflowing the stack.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(name: &str, context: Option<&str>) -> Result<Self, ResolveError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            let looped = stack
                .iter()
                .any(|(n, c)| n == name && c.as_deref() == context);
            if looped {
                let mut chain: Vec<&str> = stack.iter().map(|(n, _)| n.as_str()).collect();
                chain.push(name);
                return Err(ResolveError::Cycle {
                    chain: chain.join(" -> "),
                });
            }
            stack.push((name.to_string(), context.map(str::to_string)));
            Ok(Self)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The dependency container: binding registry, type catalogue and resolved
/// cache.
///
/// One container is created at startup and shared as `Arc<Container>` with
/// everything that resolves. All methods take `&self`; state sits behind
/// read/write locks that are released before any factory or build closure
/// runs.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tessera_core::di::{Container, Target};
///
/// struct Logger;
///
/// let built = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&built);
///
/// let container = Container::new();
/// container.singleton(
///     "Logger",
///     Target::factory(move |_| {
///         counter.fetch_add(1, Ordering::SeqCst);
///         Ok(Logger)
///     }),
/// );
///
/// let a = container.resolve("Logger", None).unwrap();
/// let b = container.resolve("Logger", Some("Mailer")).unwrap();
/// assert!(a.ptr_eq(&b));
/// assert_eq!(built.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct Container {
    bindings: RwLock<Bindings>,
    types: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
    resolved: RwLock<HashMap<String, Instance>>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type to the catalogue, replacing any earlier declaration with
    /// the same name.
    pub fn declare(&self, descriptor: TypeDescriptor) -> &Self {
        self.types
            .write()
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
        self
    }

    /// Binds `name` to `target`.
    pub fn bind(&self, name: &str, target: impl Into<Target>) -> &Self {
        self.register(binding_key(name, None), target.into(), false)
    }

    /// Binds `name` to `target` when resolved on behalf of `context`.
    pub fn bind_for(&self, name: &str, context: &str, target: impl Into<Target>) -> &Self {
        self.register(binding_key(name, Some(context)), target.into(), false)
    }

    /// Binds `name` to `target` and marks the key singleton.
    pub fn singleton(&self, name: &str, target: impl Into<Target>) -> &Self {
        self.register(binding_key(name, None), target.into(), true)
    }

    /// Contextual variant of [`Container::singleton`].
    pub fn singleton_for(&self, name: &str, context: &str, target: impl Into<Target>) -> &Self {
        self.register(binding_key(name, Some(context)), target.into(), true)
    }

    fn register(&self, key: String, target: Target, singleton: bool) -> &Self {
        debug!(key = %key, singleton, "binding registered");
        self.bindings.write().insert(key, target, singleton);
        self
    }

    /// Resolves `name`, optionally on behalf of the consumer `context`.
    ///
    /// Lookup order: the contextual key `name::context` (cache, then
    /// binding), the bare `name` (cache, then binding), then construction
    /// from the type catalogue.
    ///
    /// # Errors
    ///
    /// Returns an unresolvable [`ResolveError`] when nothing can satisfy the
    /// name or one of its constructor parameters, and other variants for
    /// cycles and failing factories.
    pub fn resolve(&self, name: &str, context: Option<&str>) -> Result<Instance, ResolveError> {
        let _guard = ResolutionGuard::enter(name, context)?;

        if let Some(context) = context {
            let key = binding_key(name, Some(context));
            if let Some(instance) = self.cached(&key) {
                return Ok(instance);
            }
            let target = self
                .bindings
                .read()
                .get(&key)
                .filter(|target| !names_itself(target, name));
            if let Some(target) = target {
                let instance = self.resolve_target(name, &target, Some(context))?;
                return Ok(self.save_and_return(&key, instance));
            }
        }

        if let Some(instance) = self.cached(name) {
            return Ok(instance);
        }

        let target = self.bindings.read().get(name);
        if let Some(target) = target {
            let instance = self.resolve_target(name, &target, context)?;
            return Ok(self.save_and_return(name, instance));
        }

        let instance = self.construct(name)?;
        Ok(self.save_and_return(name, instance))
    }

    /// Resolves `name` with no context and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// Fails like [`Container::resolve`], or with
    /// [`ResolveError::TypeMismatch`] when the instance is not a `T`.
    pub fn make<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        self.resolve(name, None)?.get::<T>(name)
    }

    /// Contextual variant of [`Container::make`].
    ///
    /// # Errors
    ///
    /// See [`Container::make`].
    pub fn make_for<T: Any + Send + Sync>(
        &self,
        name: &str,
        context: &str,
    ) -> Result<Arc<T>, ResolveError> {
        self.resolve(name, Some(context))?.get::<T>(name)
    }

    /// Produces the value a binding target stands for.
    ///
    /// Names resolve recursively with the same context, factories are called
    /// with the container, literals are returned unchanged. A target naming
    /// the key it is bound under is constructed directly.
    ///
    /// [`Container::resolve`] never passes a self-named contextual binding
    /// here: `bind_for("Cache", "Reports", "Cache")` resolves `Cache` as if
    /// no context were given, so a bare `Cache` binding still applies.
    ///
    /// # Errors
    ///
    /// Propagates resolution and factory failures.
    pub fn resolve_target(
        &self,
        bound_name: &str,
        target: &Target,
        context: Option<&str>,
    ) -> Result<Instance, ResolveError> {
        match target {
            Target::Name(name) if name == bound_name => self.construct(name),
            Target::Name(name) => self.resolve(name, context),
            Target::Factory(factory) => factory(self),
            Target::Value(instance) => Ok(instance.clone()),
        }
    }

    /// Builds a fresh instance of a declared concrete type, resolving each
    /// constructor parameter with `type_name` as its context.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownType`] for undeclared names,
    /// [`ResolveError::Interface`] for interfaces, and a parameter error
    /// naming the parameter when one cannot be supplied.
    pub fn construct(&self, type_name: &str) -> Result<Instance, ResolveError> {
        let descriptor = self
            .types
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| ResolveError::unknown(type_name))?;

        if descriptor.is_interface() {
            return Err(ResolveError::Interface {
                name: type_name.to_string(),
            });
        }

        let values = descriptor
            .params()
            .iter()
            .map(|param| self.supply(descriptor.name(), param))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(type_name, args = values.len(), "constructing");
        descriptor.build(&Args::new(descriptor.name(), descriptor.params(), values))
    }

    fn supply(&self, owner: &str, param: &Param) -> Result<Instance, ResolveError> {
        let ParamKind::Named(type_name) = param.kind() else {
            return param.default().cloned().ok_or_else(|| ResolveError::Parameter {
                owner: owner.to_string(),
                param: param.name().to_string(),
            });
        };

        match self.resolve(type_name, Some(owner)) {
            Ok(instance) => Ok(instance),
            Err(err) if err.is_unresolvable() => match param.default() {
                Some(default) => {
                    debug!(owner, param = param.name(), error = %err, "using parameter default");
                    Ok(default.clone())
                }
                None => Err(ResolveError::Dependency {
                    owner: owner.to_string(),
                    param: param.name().to_string(),
                    source: Box::new(err),
                }),
            },
            Err(err) => Err(err),
        }
    }

    fn cached(&self, key: &str) -> Option<Instance> {
        self.resolved.read().get(key).cloned()
    }

    /// Caches `instance` under `key` when the key is marked singleton, or
    /// when it has no binding and the instance declares the singleton
    /// capability. An existing entry is never replaced.
    fn save_and_return(&self, key: &str, instance: Instance) -> Instance {
        let singleton = {
            let bindings = self.bindings.read();
            bindings.is_singleton(key) || (!bindings.contains(key) && instance.declares_singleton())
        };

        if singleton {
            self.resolved
                .write()
                .entry(key.to_string())
                .or_insert_with(|| instance.clone());
        }
        instance
    }

    /// Returns `true` if an instance is cached under `key`.
    pub fn is_resolved(&self, key: &str) -> bool {
        self.resolved.read().contains_key(key)
    }

    /// Returns `true` if a binding exists under `key`.
    pub fn has_binding(&self, key: &str) -> bool {
        self.bindings.read().contains(key)
    }

    /// Returns `true` if `name` is in the type catalogue.
    pub fn is_declared(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }
}

fn names_itself(target: &Target, name: &str) -> bool {
    matches!(target, Target::Name(alias) if alias == name)
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.read().len())
            .field("types", &self.types.read().len())
            .field("resolved", &self.resolved.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Transport(&'static str);

    #[derive(Debug)]
    struct Mailer {
        transport: Arc<Transport>,
    }

    struct Paginator {
        per_page: u32,
    }

    fn mail_container() -> Container {
        let container = Container::new();
        container
            .declare(TypeDescriptor::interface("Transport"))
            .declare(TypeDescriptor::concrete("SmtpTransport", |_| Ok(Transport("smtp"))))
            .declare(TypeDescriptor::concrete("LogTransport", |_| Ok(Transport("log"))))
            .declare(
                TypeDescriptor::concrete("Mailer", |args| {
                    Ok(Mailer {
                        transport: args.get(0)?,
                    })
                })
                .param(Param::named("transport", "Transport")),
            );
        container
    }

    #[test]
    fn test_singleton_factory_runs_once_across_contexts() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let container = Container::new();
        container.singleton(
            "Logger",
            Target::factory(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(String::from("logger"))
            }),
        );

        let a = container.resolve("Logger", Some("Orders")).unwrap();
        let b = container.resolve("Logger", Some("Billing")).unwrap();
        let c = container.resolve("Logger", None).unwrap();

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(a.ptr_eq(&b));
        assert!(b.ptr_eq(&c));
    }

    #[test]
    fn test_plain_binding_builds_fresh_instances() {
        let container = Container::new();
        container.bind("Counter", Target::factory(|_| Ok(0_u32)));

        let a = container.resolve("Counter", None).unwrap();
        let b = container.resolve("Counter", None).unwrap();
        assert!(!a.ptr_eq(&b));
        assert!(!container.is_resolved("Counter"));
    }

    #[test]
    fn test_contextual_binding_takes_precedence() {
        let container = mail_container();
        container.bind("Transport", "SmtpTransport");
        container.bind_for("Transport", "Mailer", "LogTransport");

        let mailer = container.make::<Mailer>("Mailer").unwrap();
        assert_eq!(mailer.transport.0, "log");

        let direct = container.make::<Transport>("Transport").unwrap();
        assert_eq!(direct.0, "smtp");

        let other = container.make_for::<Transport>("Transport", "Reports").unwrap();
        assert_eq!(other.0, "smtp");
    }

    #[test]
    fn test_unbound_interface_is_unresolvable_until_bound() {
        let container = mail_container();

        let err = container.resolve("Transport", None).unwrap_err();
        assert!(matches!(err, ResolveError::Interface { .. }));
        assert!(err.is_unresolvable());

        container.bind("Transport", "SmtpTransport");
        assert_eq!(container.make::<Transport>("Transport").unwrap().0, "smtp");
    }

    #[test]
    fn test_unresolvable_parameter_names_owner_and_param() {
        let container = mail_container();
        let err = container.resolve("Mailer", None).unwrap_err();

        match &err {
            ResolveError::Dependency { owner, param, source } => {
                assert_eq!(owner, "Mailer");
                assert_eq!(param, "transport");
                assert!(matches!(**source, ResolveError::Interface { .. }));
            }
            other => panic!("expected Dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_parameter_uses_default() {
        let container = Container::new();
        container.declare(
            TypeDescriptor::concrete("Paginator", |args| {
                Ok(Paginator {
                    per_page: args.value(0)?,
                })
            })
            .param(Param::builtin("per_page", "int").default_value(15_u32)),
        );

        assert_eq!(container.make::<Paginator>("Paginator").unwrap().per_page, 15);
    }

    #[test]
    fn test_builtin_parameter_without_default_fails() {
        let container = Container::new();
        container.declare(
            TypeDescriptor::concrete("Paginator", |args| {
                Ok(Paginator {
                    per_page: args.value(0)?,
                })
            })
            .param(Param::builtin("per_page", "int")),
        );

        let err = container.resolve("Paginator", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot construct `Paginator` because `per_page` is not initializable"
        );
    }

    #[test]
    fn test_union_and_untyped_parameters_never_resolve_by_name() {
        let container = Container::new();
        container.bind("A", Target::value(1_u8));
        container.declare(
            TypeDescriptor::concrete("Widget", |args| Ok((args.value::<u8>(0)?, args.value::<u8>(1)?)))
                .param(Param::union("either", ["A", "B"]).default_value(7_u8))
                .param(Param::untyped("raw").default_value(9_u8)),
        );

        assert_eq!(*container.make::<(u8, u8)>("Widget").unwrap(), (7, 9));
    }

    #[test]
    fn test_named_parameter_falls_back_to_default() {
        let container = Container::new();
        container.declare(
            TypeDescriptor::concrete("Report", |args| args.value::<String>(0))
                .param(Param::named("title", "Title").default_value(String::from("untitled"))),
        );

        assert_eq!(*container.make::<String>("Report").unwrap(), "untitled");
    }

    #[test]
    fn test_failing_factory_is_not_replaced_by_default() {
        let container = Container::new();
        container.bind(
            "Title",
            Target::factory(|_| -> Result<String, ResolveError> {
                Err(ResolveError::factory("Title", anyhow::anyhow!("db down")))
            }),
        );
        container.declare(
            TypeDescriptor::concrete("Report", |args| args.value::<String>(0))
                .param(Param::named("title", "Title").default_value(String::from("untitled"))),
        );

        let err = container.resolve("Report", None).unwrap_err();
        assert!(matches!(err, ResolveError::Factory { .. }));
    }

    #[test]
    fn test_implicit_singleton_capability() {
        let container = Container::new();
        container.declare(TypeDescriptor::concrete("Clock", |_| Ok(0_u64)).singleton());

        let a = container.resolve("Clock", None).unwrap();
        let b = container.resolve("Clock", None).unwrap();
        assert!(a.ptr_eq(&b));
        assert!(container.is_resolved("Clock"));
    }

    #[test]
    fn test_singleton_capability_ignored_under_plain_binding() {
        let container = Container::new();
        container.declare(TypeDescriptor::concrete("SystemClock", |_| Ok(0_u64)).singleton());
        container.bind("Clock", "SystemClock");

        container.resolve("Clock", None).unwrap();
        assert!(!container.is_resolved("Clock"));
        assert!(container.is_resolved("SystemClock"));
    }

    #[test]
    fn test_literal_binding_passes_through() {
        let container = Container::new();
        let literal = Instance::new(String::from("https://example.test"));
        container.bind("base_url", literal.clone());

        let resolved = container.resolve("base_url", Some("Client")).unwrap();
        assert!(resolved.ptr_eq(&literal));
    }

    #[test]
    fn test_factory_receives_container() {
        let container = Container::new();
        container.bind("Host", Target::value(String::from("localhost")));
        container.bind(
            "Url",
            Target::factory(|c: &Container| Ok(format!("http://{}", c.make::<String>("Host")?))),
        );

        assert_eq!(*container.make::<String>("Url").unwrap(), "http://localhost");
    }

    #[test]
    fn test_self_named_singleton_constructs_declaration() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let container = Container::new();
        container.declare(TypeDescriptor::concrete("Registry", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        container.singleton("Registry", "Registry");

        let a = container.resolve("Registry", None).unwrap();
        let b = container.resolve("Registry", None).unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_named_contextual_binding_uses_bare_binding() {
        let container = Container::new();
        container.bind("Cache", Target::value(String::from("bare-binding")));
        container.bind_for("Cache", "Reports", "Cache");

        let cache = container.make_for::<String>("Cache", "Reports").unwrap();
        assert_eq!(*cache, "bare-binding");
    }

    #[test]
    fn test_self_named_contextual_binding_without_bare_binding_constructs() {
        let container = mail_container();
        container.bind_for("LogTransport", "Reports", "LogTransport");

        let transport = container.make_for::<Transport>("LogTransport", "Reports").unwrap();
        assert_eq!(transport.0, "log");
    }

    #[test]
    fn test_rebinding_does_not_evict_cache() {
        let container = Container::new();
        container.singleton("Config", Target::value(1_u32));
        assert_eq!(*container.make::<u32>("Config").unwrap(), 1);

        container.singleton("Config", Target::value(2_u32));
        assert_eq!(*container.make::<u32>("Config").unwrap(), 1);
    }

    #[test]
    fn test_contextual_singleton_is_cached_separately() {
        let container = Container::new();
        container.singleton("Cache", Target::factory(|_| Ok(String::from("shared"))));
        container.singleton_for("Cache", "Reports", Target::factory(|_| Ok(String::from("reports"))));

        let reports = container.resolve("Cache", Some("Reports")).unwrap();
        let shared = container.resolve("Cache", None).unwrap();
        assert!(!reports.ptr_eq(&shared));
        assert!(container.is_resolved("Cache::Reports"));
        assert!(reports.ptr_eq(&container.resolve("Cache", Some("Reports")).unwrap()));
    }

    #[test]
    fn test_unknown_type() {
        let container = Container::new();
        let err = container.resolve("Nope", None).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownType { .. }));
        assert!(!container.is_declared("Nope"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let container = Container::new();
        container
            .declare(TypeDescriptor::concrete("A", |_| Ok(())).param(Param::named("b", "B")))
            .declare(TypeDescriptor::concrete("B", |_| Ok(())).param(Param::named("a", "A")));

        let err = container.resolve("A", None).unwrap_err();
        assert!(matches!(err, ResolveError::Cycle { .. }), "got {err:?}");
        assert!(!err.is_unresolvable());

        // the guard unwinds, so unrelated resolutions still work
        container.bind("C", Target::value(3_u8));
        assert_eq!(*container.make::<u8>("C").unwrap(), 3);
    }

    #[test]
    fn test_make_type_mismatch() {
        let container = Container::new();
        container.bind("Port", Target::value(8080_u16));
        assert!(matches!(
            container.make::<String>("Port"),
            Err(ResolveError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_shared_across_threads() {
        let container = Arc::new(Container::new());
        container.singleton("Id", Target::factory(|_| Ok(42_u64)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let container = Arc::clone(&container);
                std::thread::spawn(move || *container.make::<u64>("Id").unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
        assert!(container.is_resolved("Id"));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn contextual_binding_wins_only_for_its_context(
                name in "[A-Z][a-z]{1,8}",
                context in "[A-Z][a-z]{1,8}",
                other in "[A-Z][a-z]{1,8}",
            ) {
                prop_assume!(context != other);

                let container = Container::new();
                container.bind(&name, Target::value(String::from("global")));
                container.bind_for(&name, &context, Target::value(String::from("contextual")));

                let scoped = container.make_for::<String>(&name, &context).unwrap();
                let fallback = container.make_for::<String>(&name, &other).unwrap();
                let bare = container.make::<String>(&name).unwrap();

                prop_assert_eq!(scoped.as_str(), "contextual");
                prop_assert_eq!(fallback.as_str(), "global");
                prop_assert_eq!(bare.as_str(), "global");
            }

            #[test]
            fn singleton_resolution_is_identity_stable(
                contexts in proptest::collection::vec(proptest::option::of("[a-z]{1,6}"), 1..6),
            ) {
                let container = Container::new();
                container.singleton("Logger", Target::factory(|_| Ok(String::from("log"))));

                let first = container.resolve("Logger", None).unwrap();
                for context in &contexts {
                    let again = container.resolve("Logger", context.as_deref()).unwrap();
                    prop_assert!(first.ptr_eq(&again));
                }
            }
        }
    }
}
