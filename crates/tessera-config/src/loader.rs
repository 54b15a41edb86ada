//! Layered configuration loading.
//!
//! Later layers override earlier ones:
//!
//! 1. defaults
//! 2. a TOML or JSON file
//! 3. variables from a `.env` file
//! 4. process environment variables
//!
//! Recognized variables:
//!
//! | Variable               | Effect                                       |
//! |------------------------|----------------------------------------------|
//! | `APP_DEBUG`            | debug mode, on only for the exact value `true` |
//! | `APP_PORT`             | replaces the port of the listen address      |
//! | `<PREFIX>_HTTP_ADDR`   | replaces the whole listen address            |
//! | `<PREFIX>_LOG_LEVEL`   | log filter directive                         |
//! | `<PREFIX>_LOG_FORMAT`  | `json` or `pretty`                           |
//! | `<PREFIX>_VIEW_PATH`   | template directory                           |

use std::collections::HashMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::{AppConfig, ConfigError, LogFormat};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "TESSERA";

/// Configuration loader with a layered approach.
///
/// # Example
///
/// ```no_run
/// use tessera_config::ConfigLoader;
///
/// # fn main() -> Result<(), tessera_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("tessera.toml")?
///     .with_dotenv()?
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AppConfig,
    env_prefix: String,
    dotenv: Vec<(String, String)>,
    env: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            dotenv: Vec::new(),
            env: None,
        }
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AppConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AppConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file, replacing the current configuration.
    /// Sections the file leaves out take their defaults.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.config = parse(&content, &format)
            .map_err(|err| match err {
                ConfigError::UnsupportedFormat(_) => {
                    ConfigError::UnsupportedFormat(path.display().to_string())
                }
                other => other,
            })?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` (`toml` or `json`).
    ///
    /// ```
    /// use tessera_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_env_vars(Vec::<(String, String)>::new())
    ///     .with_string("[server]\nhttp_addr = \"127.0.0.1:3000\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Sets the prefix for `<PREFIX>_*` variables. Defaults to `TESSERA`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_uppercase();
        self
    }

    /// Reads `.env` from the working directory or its parents, if present.
    /// Process variables take precedence over its entries.
    pub fn with_dotenv(mut self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv_iter() {
            Ok(iter) => {
                for item in iter {
                    self.dotenv.push(item?);
                }
                Ok(self)
            }
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Reads a specific `.env`-style file.
    pub fn with_dotenv_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        for item in dotenvy::from_path_iter(path.as_ref())? {
            self.dotenv.push(item?);
        }
        Ok(self)
    }

    /// Uses `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Applies environment overrides, validates, and returns the result.
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    pub fn load_unvalidated(mut self) -> Result<AppConfig, ConfigError> {
        let mut vars: HashMap<String, String> = self.dotenv.drain(..).collect();
        match self.env.take() {
            Some(env) => vars.extend(env),
            None => vars.extend(env::vars()),
        }

        self.apply_env(&vars)?;
        Ok(self.config)
    }

    fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(value) = vars.get("APP_DEBUG") {
            self.config.debug = value == "true";
        }

        if let Some(value) = vars.get("APP_PORT") {
            let port: u16 = value
                .parse()
                .map_err(|_| ConfigError::env_parse_error("APP_PORT", "expected a port number"))?;
            let mut addr: SocketAddr = self.config.socket_addr()?;
            addr.set_port(port);
            self.config.server.http_addr = addr.to_string();
        }

        let prefixed = |suffix: &str| vars.get(&format!("{}_{suffix}", self.env_prefix));

        if let Some(value) = prefixed("HTTP_ADDR") {
            self.config.server.http_addr = value.clone();
        }
        if let Some(value) = prefixed("LOG_LEVEL") {
            self.config.logging.level = value.clone();
        }
        if let Some(value) = prefixed("LOG_FORMAT") {
            self.config.logging.format = match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::env_parse_error(
                        format!("{}_LOG_FORMAT", self.env_prefix),
                        "expected 'json' or 'pretty'",
                    ))
                }
            };
        }
        if let Some(value) = prefixed("VIEW_PATH") {
            self.config.views.path = (!value.is_empty()).then(|| PathBuf::from(value));
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<AppConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}
