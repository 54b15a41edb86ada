//! Contextual dependency injection.
//!
//! The [`Container`] maps logical names to construction targets. A name is
//! resolved in this order:
//!
//! 1. the contextual key `name::context`, when resolving on behalf of a
//!    consumer (cached instance first, then binding);
//! 2. the bare `name` (cached instance first, then binding);
//! 3. construction from the declared [`TypeDescriptor`], resolving each
//!    constructor parameter with the owning type as context.
//!
//! Instances are cached when their key is bound with
//! [`Container::singleton`], or when the key has no binding and the instance
//! declares the singleton capability. The first cached instance wins and is
//! never evicted.
//!
//! # Example
//!
//! ```rust
//! use tessera_core::di::{Container, Param, TypeDescriptor};
//!
//! struct Transport(&'static str);
//! struct Mailer {
//!     transport: std::sync::Arc<Transport>,
//! }
//!
//! let container = Container::new();
//! container
//!     .declare(TypeDescriptor::interface("Transport"))
//!     .declare(TypeDescriptor::concrete("Smtp", |_| Ok(Transport("smtp"))))
//!     .declare(TypeDescriptor::concrete("Outbox", |_| Ok(Transport("outbox"))))
//!     .declare(
//!         TypeDescriptor::concrete("Mailer", |args| Ok(Mailer { transport: args.get(0)? }))
//!             .param(Param::named("transport", "Transport")),
//!     );
//!
//! container.bind("Transport", "Smtp");
//! container.bind_for("Transport", "Mailer", "Outbox");
//!
//! let mailer = container.make::<Mailer>("Mailer").unwrap();
//! assert_eq!(mailer.transport.0, "outbox");
//! ```

mod binding;
mod container;
mod descriptor;
mod error;
mod instance;

pub use binding::{binding_key, Factory, Target};
pub use container::Container;
pub use descriptor::{Args, Param, ParamKind, TypeDescriptor};
pub use error::ResolveError;
pub use instance::Instance;
