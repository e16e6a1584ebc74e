use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub store: StoreConfig,
    /// PostgreSQL settings; the in-memory store is used when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    /// Key rate limiting on the first `X-Forwarded-For` entry instead of the
    /// peer address. Only enable behind a proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .finish()
    }
}

impl JwtConfig {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.access_token_ttl_minutes).unwrap_or(0) * 60)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Refill rate in tokens per second
    pub requests_per_second: f64,
    /// Bucket capacity; defaults to the refill rate
    #[serde(default)]
    pub burst: Option<f64>,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl RateLimitConfig {
    pub fn burst(&self) -> f64 {
        self.burst.unwrap_or(self.requests_per_second)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

fn default_purge_interval_secs() -> u64 {
    60
}

fn default_idle_timeout_secs() -> u64 {
    180
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Upper bound on a single credential store call
    pub timeout_ms: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, RATE_LIMIT__REQUESTS_PER_SECOND, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.jwt.access_token_ttl_minutes <= 0 {
            return Err(ConfigError::Message(
                "jwt.access_token_ttl_minutes must be positive".into(),
            ));
        }
        let rate = self.rate_limit.requests_per_second;
        if rate.is_nan() || rate <= 0.0 {
            return Err(ConfigError::Message(
                "rate_limit.requests_per_second must be positive".into(),
            ));
        }
        let burst = self.rate_limit.burst();
        if burst.is_nan() || burst < 1.0 {
            return Err(ConfigError::Message(
                "rate_limit.burst must be at least 1".into(),
            ));
        }
        if self.rate_limit.purge_interval_secs == 0 {
            return Err(ConfigError::Message(
                "rate_limit.purge_interval_secs must be positive".into(),
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::Message("store.timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig {
                http_port: 8080,
                trust_forwarded_for: false,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-for-jwt-signing-at-least-32-bytes".to_string(),
                access_token_ttl_minutes: 15,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: 5.0,
                burst: None,
                purge_interval_secs: 60,
                idle_timeout_secs: 180,
            },
            store: StoreConfig { timeout_ms: 3000 },
            database: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.burst(), 5.0);
        assert_eq!(config.jwt.access_token_ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_rejects_empty_secret() {
        let mut config = config();
        config.jwt.secret.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let mut config = config();
        config.jwt.access_token_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_rate_limit() {
        let mut config = config();
        config.rate_limit.requests_per_second = 0.0;
        assert!(config.validate().is_err());

        let mut config = self::config();
        config.rate_limit.burst = Some(0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides_files() {
        env::set_var("JWT__SECRET", "from-env-secret-value-at-least-32-bytes");
        env::set_var("RATE_LIMIT__REQUESTS_PER_SECOND", "42.0");

        let loaded = Config::load();

        env::remove_var("JWT__SECRET");
        env::remove_var("RATE_LIMIT__REQUESTS_PER_SECOND");

        let config = loaded.expect("Failed to load configuration");
        assert_eq!(config.jwt.secret, "from-env-secret-value-at-least-32-bytes");
        assert_eq!(config.rate_limit.requests_per_second, 42.0);
        // Values without an override still come from config/default.toml.
        assert_eq!(config.server.http_port, 8080);
    }

    #[test]
    fn test_secret_is_not_debug_printed() {
        let rendered = format!("{:?}", config().jwt);
        assert!(!rendered.contains("test-secret-key"));
    }
}
