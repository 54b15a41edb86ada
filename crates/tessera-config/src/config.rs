//! Configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default listen address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3408";

/// Complete application configuration.
///
/// Every section is optional in files; missing sections and fields take
/// their defaults. Unknown fields are rejected.
///
/// ```
/// use tessera_config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:3408");
/// assert!(!config.debug);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Debug mode: unhandled failures are answered with a diagnostic report
    /// and templates are reloaded on every render.
    #[serde(default)]
    pub debug: bool,

    /// HTTP transport settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Template settings.
    #[serde(default)]
    pub views: ViewsSection,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl AppConfig {
    /// A preset for local development: debug on, debug-level pretty logs,
    /// template cache off.
    #[must_use]
    pub fn development() -> Self {
        Self {
            debug: true,
            server: ServerSection::default(),
            views: ViewsSection {
                path: None,
                cache: false,
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    /// A preset for deployments: debug off, JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LoggingSection {
                level: "info".to_string(),
                format: LogFormat::Json,
            },
            ..Self::default()
        }
    }

    /// Parses the listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        if let Some(path) = &self.views.path {
            if !path.is_dir() {
                return Err(ConfigError::invalid_value(
                    "views.path",
                    format!("not a directory: {}", path.display()),
                ));
            }
        }

        Ok(())
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSection {
    /// Listen address.
    pub http_addr: String,
    /// Seconds open connections get to finish after shutdown starts.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout_secs: 30,
        }
    }
}

/// Template settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ViewsSection {
    /// Template directory. Without one, no template engine is installed.
    pub path: Option<PathBuf>,
    /// Keep loaded templates between renders.
    pub cache: bool,
}

impl Default for ViewsSection {
    fn default() -> Self {
        Self {
            path: None,
            cache: true,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSection {
    /// Filter directive, e.g. `info` or `tessera_server=debug,info`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.shutdown_timeout_secs, 30);
        assert!(config.views.cache);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_presets() {
        let dev = AppConfig::development();
        assert!(dev.debug);
        assert!(!dev.views.cache);
        assert_eq!(dev.logging.level, "debug");

        let prod = AppConfig::production();
        assert!(!prod.debug);
        assert_eq!(prod.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_address() {
        let mut config = AppConfig::default();
        config.server.http_addr = "localhost:http".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.http_addr"
        ));
    }

    #[test]
    fn test_views_path_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();

        config.views.path = Some(dir.path().to_path_buf());
        assert!(config.validate().is_ok());

        config.views.path = Some(dir.path().join("missing"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<AppConfig, _> = serde_json::from_str(r#"{"server": {"port": 80}}"#);
        assert!(result.is_err());
    }
}
