//! API server configuration.
//!
//! Built-in defaults, overridden by `STOCKBOOK_*` environment variables
//! (`STOCKBOOK_PORT=8080`, `STOCKBOOK_JWT_SECRET=...`).

use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use stockbook_db::{DbConfig, RetryPolicy};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "STOCKBOOK";

/// Secret used when `STOCKBOOK_JWT_SECRET` is unset. Local development only.
pub const DEV_JWT_SECRET: &str = "stockbook-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Secret used to verify bearer tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds (for tokens this server issues)
    pub jwt_lifetime_secs: i64,

    /// Attempts per post before giving up with a 409
    pub posting_max_attempts: u32,

    /// Base backoff between attempts
    pub posting_backoff_ms: u64,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl ApiConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from an explicit variable map instead of the
    /// process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let config: ApiConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("database_path", "./stockbook.db")?
            .set_default("max_connections", 5)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_lifetime_secs", 3600)?
            .set_default("posting_max_attempts", 3)?
            .set_default("posting_backoff_ms", 20)?
            .set_default("log_level", "info")?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("jwt_secret".to_string()));
        }
        if self.posting_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("posting_max_attempts".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        Ok(())
    }

    /// True while tokens are verified with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// `host:port` bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.posting_max_attempts,
            Duration::from_millis(self.posting_backoff_ms),
        )
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_vars(HashMap::new()).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.posting_max_attempts, 3);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.log_level, "info");
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_explicit_secret_replaces_dev_secret() {
        let config = ApiConfig::from_vars(vars(&[("STOCKBOOK_JWT_SECRET", "rotated-secret")])).unwrap();
        assert_eq!(config.jwt_secret, "rotated-secret");
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_environment_overrides() {
        let config = ApiConfig::from_vars(vars(&[
            ("STOCKBOOK_PORT", "8080"),
            ("STOCKBOOK_DATABASE_PATH", "/tmp/books.db"),
            ("STOCKBOOK_POSTING_MAX_ATTEMPTS", "7"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path, "/tmp/books.db");
        assert_eq!(config.retry_policy().max_attempts, 7);
        assert_eq!(config.db_config().max_connections, 5);
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let result = ApiConfig::from_vars(vars(&[("STOCKBOOK_POSTING_MAX_ATTEMPTS", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(field)) if field == "posting_max_attempts"));
    }

    #[test]
    fn test_rejects_unparseable_port() {
        let result = ApiConfig::from_vars(vars(&[("STOCKBOOK_PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
