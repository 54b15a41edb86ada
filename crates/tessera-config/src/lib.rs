//! Layered configuration for Tessera applications.
//!
//! - TOML and JSON files
//! - `.env` files via `dotenvy`
//! - environment variable overrides
//! - strict parsing (unknown fields are errors)
//!
//! # Example
//!
//! ```no_run
//! use tessera_config::ConfigLoader;
//!
//! # fn main() -> Result<(), tessera_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("tessera.toml")?
//!     .with_dotenv()?
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! debug = false
//!
//! [server]
//! http_addr = "0.0.0.0:3408"
//! shutdown_timeout_secs = 30
//!
//! [views]
//! path = "resources/views"
//! cache = true
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{
    AppConfig, LogFormat, LoggingSection, ServerSection, ViewsSection, DEFAULT_HTTP_ADDR,
};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
