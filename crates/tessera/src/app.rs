//! The application: container, routes, middleware and transport in one
//! place.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use tessera_config::{AppConfig, LogFormat};
use tessera_core::di::{Container, Instance, ResolveError, Target, TypeDescriptor};
use tessera_core::{HandlerRef, IntoHandler, NoViews, ViewEngine};
use tessera_middleware::{BoxedMiddleware, JsonBodyParser, Middleware, Pipeline};
use tessera_router::RouteTable;
use tessera_server::{
    DefaultErrorHandler, Dispatcher, ErrorHandler, Kernel, Normalizer, Server, ServerConfig,
    ShutdownSignal, TemplateViews,
};
use tessera_telemetry::{init_logging, LogConfig, TelemetryError};
use tracing::{debug, info};

use crate::error::AppError;

type BootCallback = Box<dyn FnOnce(&Application, SocketAddr) + Send>;

/// A Tessera application.
///
/// Owns the root [`Container`], the route table, the middleware stack, the
/// error handler and the view engine. Container methods take `&self`, since
/// the container is shared with everything that resolves; everything else
/// is configured through `&mut self` before [`run`](Self::run).
///
/// # Example
///
/// ```rust,ignore
/// use tessera::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), AppError> {
///     let config = ConfigLoader::new().with_dotenv()?.load()?;
///     let mut app = Application::new(config);
///
///     app.singleton("Logger", Target::factory(|_| Ok(Logger::default())));
///     app.get("/users/{id}", |_request: Request, params: PathParams| -> HandlerResult {
///         Ok(format!("user {}", &params[0]).into())
///     });
///
///     app.run().await
/// }
/// ```
pub struct Application {
    config: AppConfig,
    container: Arc<Container>,
    routes: RouteTable<HandlerRef>,
    middleware: Vec<BoxedMiddleware>,
    errors: Arc<dyn ErrorHandler>,
    views: Option<Arc<dyn ViewEngine>>,
    boot: Option<BootCallback>,
}

impl Application {
    /// Creates an application with an empty container and route table.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            container: Arc::new(Container::new()),
            routes: RouteTable::new(),
            middleware: Vec::new(),
            errors: Arc::new(DefaultErrorHandler),
            views: None,
            boot: None,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Whether debug mode is on.
    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    /// The root container.
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// The route table.
    pub fn routes(&self) -> &RouteTable<HandlerRef> {
        &self.routes
    }

    // Container

    /// Adds a type to the container's catalogue.
    pub fn declare(&self, descriptor: TypeDescriptor) -> &Self {
        self.container.declare(descriptor);
        self
    }

    /// Binds `name` to `target`.
    pub fn bind(&self, name: &str, target: impl Into<Target>) -> &Self {
        self.container.bind(name, target);
        self
    }

    /// Binds `name` to `target` for consumers named `context`.
    pub fn bind_for(&self, name: &str, context: &str, target: impl Into<Target>) -> &Self {
        self.container.bind_for(name, context, target);
        self
    }

    /// Binds `name` to `target`, resolving it at most once.
    pub fn singleton(&self, name: &str, target: impl Into<Target>) -> &Self {
        self.container.singleton(name, target);
        self
    }

    /// Contextual variant of [`singleton`](Self::singleton).
    pub fn singleton_for(&self, name: &str, context: &str, target: impl Into<Target>) -> &Self {
        self.container.singleton_for(name, context, target);
        self
    }

    /// Resolves `name`.
    pub fn make(&self, name: &str) -> Result<Instance, ResolveError> {
        self.container.resolve(name, None)
    }

    /// Resolves `name` on behalf of `context`.
    pub fn make_for(&self, name: &str, context: &str) -> Result<Instance, ResolveError> {
        self.container.resolve(name, Some(context))
    }

    /// Resolves `name` and downcasts it to `T`.
    pub fn make_as<T: std::any::Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        self.container.make::<T>(name)
    }

    // Routes

    /// Registers `handler` for `method` requests matching `pattern`.
    ///
    /// `handler` is a closure, a `"Type@action"` descriptor, a bare
    /// controller name or a `(type, action)` pair.
    pub fn route(&mut self, method: Method, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.routes.add(method, pattern, handler.into_handler());
        self
    }

    /// Registers a GET route.
    pub fn get(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.route(Method::GET, pattern, handler)
    }

    /// Registers a POST route.
    pub fn post(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.route(Method::POST, pattern, handler)
    }

    /// Registers a PUT route.
    pub fn put(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.route(Method::PUT, pattern, handler)
    }

    /// Registers a PATCH route.
    pub fn patch(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.route(Method::PATCH, pattern, handler)
    }

    /// Registers a DELETE route.
    pub fn delete(&mut self, pattern: &str, handler: impl IntoHandler) -> &mut Self {
        self.route(Method::DELETE, pattern, handler)
    }

    // Pipeline

    /// Replaces the error handler.
    pub fn error_handler(&mut self, handler: impl ErrorHandler) -> &mut Self {
        self.errors = Arc::new(handler);
        self
    }

    /// Appends a middleware stage. Stages run after the JSON body parser,
    /// in registration order.
    pub fn middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Replaces the view engine.
    pub fn views(&mut self, engine: impl ViewEngine) -> &mut Self {
        self.views = Some(Arc::new(engine));
        self
    }

    /// Sets the callback invoked once the listener is bound, before the
    /// first connection is accepted.
    pub fn on_boot<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(&Application, SocketAddr) + Send + 'static,
    {
        self.boot = Some(Box::new(callback));
        self
    }

    // Assembly

    /// Assembles the request kernel.
    pub fn kernel(&self) -> Kernel {
        let mut stages: Vec<BoxedMiddleware> = Vec::with_capacity(self.middleware.len() + 1);
        stages.push(Arc::new(JsonBodyParser));
        stages.extend(self.middleware.iter().cloned());

        let normalizer = Normalizer::new(self.view_engine(), Arc::clone(&self.errors), self.config.debug);
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.container),
            Arc::new(self.routes.clone()),
            normalizer,
        );
        Kernel::new(Pipeline::new(stages), dispatcher)
    }

    fn view_engine(&self) -> Arc<dyn ViewEngine> {
        if let Some(views) = &self.views {
            return Arc::clone(views);
        }
        match &self.config.views.path {
            Some(path) => Arc::new(TemplateViews::from_dir(
                path,
                self.config.views.cache && !self.config.debug,
            )),
            None => Arc::new(NoViews),
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .http_addr(self.config.server.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(self.config.server.shutdown_timeout_secs))
            .build()
    }

    fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: true,
            level: self.config.logging.level.clone(),
            json_format: self.config.logging.format == LogFormat::Json,
            include_target: true,
            file_line_info: self.config.debug,
        }
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), AppError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Initializes logging, binds the listener, invokes the boot callback
    /// and serves until `shutdown` is triggered.
    ///
    /// A subscriber installed earlier is kept.
    pub async fn run_with_shutdown(mut self, shutdown: ShutdownSignal) -> Result<(), AppError> {
        match init_logging(&self.log_config()) {
            Ok(()) | Err(TelemetryError::LoggingInit(_)) => {}
            Err(err) => return Err(err.into()),
        }
        self.config.validate()?;

        let server = Server::bind(self.server_config(), self.kernel()).await?;
        let addr = server.local_addr()?;
        info!(
            %addr,
            debug = self.config.debug,
            routes = self.routes.len(),
            "application booted"
        );

        if let Some(boot) = self.boot.take() {
            debug!("running boot callback");
            boot(&self, addr);
        }

        server.serve_with_shutdown(shutdown).await?;
        Ok(())
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware.len())
            .field("custom_views", &self.views.is_some())
            .finish_non_exhaustive()
    }
}
