//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::DEFAULT_TTL_SECS;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

// == Config Error ==
/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for environment variable {key}")]
    Invalid { key: &'static str, value: String },
}

// == Environment ==
/// Deployment environment the server runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Test,
    Dev,
    Impl,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Test => "test",
            Environment::Dev => "dev",
            Environment::Impl => "impl",
            Environment::Prod => "prod",
        }
    }

    /// True for the shared environments, where developer tooling such as
    /// the GraphQL playground is switched off.
    pub fn deployed(&self) -> bool {
        matches!(self, Environment::Dev | Environment::Impl | Environment::Prod)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Environment::Local),
            "test" => Ok(Environment::Test),
            "dev" => Ok(Environment::Dev),
            "impl" => Ok(Environment::Impl),
            "prod" => Ok(Environment::Prod),
            other => Err(ConfigError::Invalid {
                key: "APP_ENV",
                value: other.to_string(),
            }),
        }
    }
}

// == Build Info ==
/// Build metadata reported by the health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub datetime: String,
    pub timestamp: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            datetime: String::new(),
            timestamp: String::new(),
        }
    }
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file, `:memory:` for a throwaway database
    pub db_path: String,
    /// HTTP server port
    pub server_port: u16,
    /// Dog collection cache TTL in seconds
    pub cache_ttl: u64,
    pub environment: Environment,
    pub app_datetime: String,
    pub app_timestamp: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DB_PATH` - SQLite database file (required)
    /// - `API_PORT` - HTTP server port (default: 8080)
    /// - `DOG_CACHE_TTL` - Dog cache TTL in seconds (default: 60)
    /// - `APP_ENV` - local, test, dev, impl or prod (default: local)
    /// - `APP_DATETIME` / `APP_TIMESTAMP` - Build info for the health check
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns the raw value for
    /// a variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = get("DB_PATH").ok_or(ConfigError::Missing("DB_PATH"))?;
        let server_port = parse_or("API_PORT", get("API_PORT"), DEFAULT_PORT)?;
        let cache_ttl = parse_or("DOG_CACHE_TTL", get("DOG_CACHE_TTL"), DEFAULT_TTL_SECS)?;
        let environment = match get("APP_ENV") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        Ok(Self {
            db_path,
            server_port,
            cache_ttl,
            environment,
            app_datetime: get("APP_DATETIME").unwrap_or_default(),
            app_timestamp: get("APP_TIMESTAMP").unwrap_or_default(),
        })
    }

    pub fn cache_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn build_info(&self) -> BuildInfo {
        BuildInfo {
            datetime: self.app_datetime.clone(),
            timestamp: self.app_timestamp.clone(),
            ..BuildInfo::default()
        }
    }
}

fn parse_or<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            server_port: DEFAULT_PORT,
            cache_ttl: DEFAULT_TTL_SECS,
            environment: Environment::default(),
            app_datetime: String::new(),
            app_timestamp: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.db_path, ":memory:");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cache_ttl, 60);
        assert_eq!(config.environment, Environment::Local);
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup(&[("DB_PATH", "bork.db")])).unwrap();
        assert_eq!(config.db_path, "bork.db");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cache_ttl_duration(), Duration::from_secs(60));
        assert_eq!(config.environment, Environment::Local);
        assert_eq!(config.build_info().version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DB_PATH", ":memory:"),
            ("API_PORT", "9090"),
            ("DOG_CACHE_TTL", "5"),
            ("APP_ENV", "prod"),
            ("APP_DATETIME", "2024-01-01T00:00:00Z"),
            ("APP_TIMESTAMP", "1704067200"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 9090);
        assert_eq!(config.cache_ttl, 5);
        assert!(config.environment.deployed());
        let build = config.build_info();
        assert_eq!(build.datetime, "2024-01-01T00:00:00Z");
        assert_eq!(build.timestamp, "1704067200");
    }

    #[test]
    fn test_config_missing_db_path() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("DB_PATH")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("DB_PATH", "  ")])).unwrap_err(),
            ConfigError::Missing("DB_PATH")
        );
    }

    #[test]
    fn test_config_invalid_values() {
        let err = Config::from_lookup(lookup(&[("DB_PATH", "x"), ("API_PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "API_PORT",
                value: "eighty".to_string()
            }
        );

        let err = Config::from_lookup(lookup(&[("DB_PATH", "x"), ("APP_ENV", "staging")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "APP_ENV", .. }));
    }

    #[test]
    fn test_environment_deployed() {
        assert!(!Environment::Local.deployed());
        assert!(!Environment::Test.deployed());
        assert!(Environment::Dev.deployed());
        assert!(Environment::Impl.deployed());
        assert!(Environment::Prod.deployed());
        assert_eq!("impl".parse::<Environment>().unwrap(), Environment::Impl);
    }
}
