//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles sampler, database, and server settings from env and files

use config::{Config as ConfigBuilder, Environment, File};
use pw_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(nested)]
    pub sampler: SamplerConfig,
    pub telemetry: TelemetryConfig,
}

/// Observability server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub obs_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            obs_port: 9000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.obs_port)
    }
}

/// Database whose pool is sampled
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub url: String,
    /// Value of the `db_name` label on exported gauges
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            name: "main".to_string(),
            max_connections: 5,
        }
    }
}

/// Sampling cadence and shutdown behaviour
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SamplerConfig {
    #[validate(range(min = 100, max = 3600000))] // 100ms to 1h
    pub interval_ms: u64,
    /// Zero the exported gauges when the sampler stops
    pub reset_on_shutdown: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5000,
            reset_on_shutdown: true,
        }
    }
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `production` switches log output to JSON
    pub env: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional config file, and environment variables
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.obs_port", 9000)?
            .set_default("database.url", "sqlite::memory:")?
            .set_default("database.name", "main")?
            .set_default("database.max_connections", 5)?
            .set_default("sampler.interval_ms", 5000)?
            .set_default("sampler.reset_on_shutdown", true)?
            .set_default("telemetry.env", "development")?;

        // Field names containing underscores collide with the env separator
        let overrides = [
            ("POOLWATCH_SERVER_OBS_PORT", "server.obs_port"),
            ("POOLWATCH_DATABASE_MAX_CONNECTIONS", "database.max_connections"),
            ("POOLWATCH_SAMPLER_INTERVAL_MS", "sampler.interval_ms"),
            ("POOLWATCH_SAMPLER_RESET_ON_SHUTDOWN", "sampler.reset_on_shutdown"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        // Optional poolwatch.{toml,yaml,json} in the working directory
        builder = builder.add_source(File::with_name("poolwatch").required(false));

        // Environment variables with POOLWATCH_ prefix (highest priority)
        builder = builder.add_source(
            Environment::with_prefix("POOLWATCH")
                .try_parsing(true)
                .separator("_"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        parsed
            .validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Use a mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "POOLWATCH_SERVER_HOST",
        "POOLWATCH_SERVER_OBS_PORT",
        "POOLWATCH_DATABASE_NAME",
        "POOLWATCH_DATABASE_MAX_CONNECTIONS",
        "POOLWATCH_SAMPLER_INTERVAL_MS",
    ];

    fn clear_env() {
        for key in VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = Config::load().expect("Should load with defaults");

        assert_eq!(config.server.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.name, "main");
        assert_eq!(config.sampler.interval(), Duration::from_secs(5));
        assert!(config.sampler.reset_on_shutdown);
    }

    #[test]
    fn test_config_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("POOLWATCH_SERVER_HOST", "0.0.0.0");
        env::set_var("POOLWATCH_SERVER_OBS_PORT", "9100");
        env::set_var("POOLWATCH_DATABASE_NAME", "orders");
        env::set_var("POOLWATCH_SAMPLER_INTERVAL_MS", "250");

        let config = Config::load().expect("Should load from env");

        assert_eq!(config.server.bind_addr(), "0.0.0.0:9100");
        assert_eq!(config.database.name, "orders");
        assert_eq!(config.sampler.interval(), Duration::from_millis(250));

        clear_env();
    }

    #[test]
    fn test_interval_too_small_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("POOLWATCH_SAMPLER_INTERVAL_MS", "0");
        let result = Config::load();
        assert!(matches!(result, Err(Error::Config(_))));

        clear_env();
    }

    #[test]
    fn test_pool_size_validation() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("POOLWATCH_DATABASE_MAX_CONNECTIONS", "500");
        assert!(Config::load().is_err());

        clear_env();
    }

    #[test]
    fn test_default_struct_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
