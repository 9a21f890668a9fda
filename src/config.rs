//! Client configuration: defaults, optional TOML file, `.env`, environment.
//!
//! Layers are applied in that order, later ones winning:
//! - built-in defaults
//! - TOML file from `--config` or `SECURE_SNIP_CONFIG`
//! - `.env` in the working directory (loaded into the process environment)
//! - `SECURE_SNIP_API_URL`, `SECURE_SNIP_ORIGIN`, `SECURE_SNIP_LOG`,
//!   `SECURE_SNIP_TIMEOUT_SECS`

use crate::issuance::DEFAULT_CODE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_SERVICE_URL: &str = "https://secure-snip.vercel.app";

pub const ENV_CONFIG_FILE: &str = "SECURE_SNIP_CONFIG";
pub const ENV_API_URL: &str = "SECURE_SNIP_API_URL";
pub const ENV_ORIGIN: &str = "SECURE_SNIP_ORIGIN";
pub const ENV_LOG: &str = "SECURE_SNIP_LOG";
pub const ENV_TIMEOUT: &str = "SECURE_SNIP_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{key} has an invalid value: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_url: String,
    /// No timeout when unset.
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Base of the URLs encoded into codes.
    pub origin: String,
    pub qr_size: u32,
    pub export_dir: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout_seconds: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_SERVICE_URL.to_string(),
            qr_size: DEFAULT_CODE_SIZE,
            export_dir: PathBuf::from("."),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Build the full layered configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG_FILE).map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply environment-style overrides. `lookup` returns the value for a key.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.service.api_url = url;
        }
        if let Some(origin) = get(ENV_ORIGIN) {
            self.app.origin = origin;
        }
        if let Some(level) = get(ENV_LOG) {
            self.logging.level = level;
        }
        if let Some(raw) = get(ENV_TIMEOUT) {
            let secs = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT,
                value: raw.clone(),
            })?;
            self.service.request_timeout_seconds = Some(secs).filter(|s| *s > 0);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_url()?;
        self.origin()?;
        if self.app.qr_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "app.qr_size",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        parse_url("service.api_url", &self.service.api_url)
    }

    pub fn origin(&self) -> Result<Url, ConfigError> {
        parse_url("app.origin", &self.app.origin)
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value)
        .ok()
        .filter(|url| !url.cannot_be_a_base())
        .ok_or_else(|| ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_hosted_service() {
        let config = Config::default();
        assert_eq!(config.service.api_url, "https://secure-snip.vercel.app");
        assert_eq!(config.app.origin, "https://secure-snip.vercel.app");
        assert_eq!(config.app.qr_size, 200);
        assert_eq!(config.service.request_timeout_seconds, None);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [service]
            api_url = "http://localhost:3000"

            [app]
            qr_size = 320
            "#,
        )
        .unwrap();

        assert_eq!(config.service.api_url, "http://localhost:3000");
        assert_eq!(config.app.qr_size, 320);
        assert_eq!(config.app.origin, DEFAULT_SERVICE_URL);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn file_layer_then_env_layer() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[service]\napi_url = \"http://from-file\"\nrequest_timeout_seconds = 5\n[logging]\nlevel = \"warn\""
        )
        .unwrap();

        let mut config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.service.request_timeout_seconds, Some(5));

        config
            .apply_overrides(env(&[
                (ENV_API_URL, "http://from-env"),
                (ENV_LOG, "debug"),
                (ENV_ORIGIN, "  "),
            ]))
            .unwrap();

        assert_eq!(config.service.api_url, "http://from-env");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.app.origin, DEFAULT_SERVICE_URL);
        assert_eq!(config.service.request_timeout_seconds, Some(5));
    }

    #[test]
    fn timeout_override_must_be_a_number() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_overrides(env(&[(ENV_TIMEOUT, "soon")])),
            Err(ConfigError::InvalidValue { .. })
        ));

        config.apply_overrides(env(&[(ENV_TIMEOUT, "0")])).unwrap();
        assert_eq!(config.service.request_timeout_seconds, None);
        config.apply_overrides(env(&[(ENV_TIMEOUT, "12")])).unwrap();
        assert_eq!(config.service.request_timeout_seconds, Some(12));
    }

    #[test]
    fn validate_rejects_bad_urls() {
        let mut config = Config::default();
        config.service.api_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "service.api_url", .. })
        ));

        let mut config = Config::default();
        config.app.origin = "mailto:me@example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "app.origin", .. })
        ));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[service\napi_url = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}
