//! # Configuration Management
//!
//! Layered configuration for the cache subsystem: an optional TOML file
//! plus `CACHEGATE_`-prefixed environment overrides, deserialized into
//! typed settings with serde defaults matching the documented defaults.
//!
//! Wire-format settings keep plain seconds/milliseconds integers so they
//! round-trip through files and environments cleanly; `Duration`-typed
//! accessors and `to_breaker_config()` produce the runtime forms.

use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Underlying loader failure (file missing fields, bad types, ...)
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Structurally valid but semantically rejected settings
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root cache subsystem configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Master switch - `false` wires the null circuit breaker and the
    /// distributed store is never contacted
    pub enabled: bool,

    /// Backend selection: "redis" (distributed) or "local" (in-process)
    pub backend: String,

    /// Distributed backend connection settings
    pub redis: Option<RedisSettings>,

    /// In-process fallback cache settings
    pub local: LocalCacheSettings,

    /// Circuit breaker tuning
    pub circuit_breaker: CircuitBreakerSettings,

    /// Key namespacing and TTL table
    pub keys: KeySettings,
}

impl CacheSettings {
    /// Load settings from an optional TOML file plus environment overrides.
    ///
    /// Environment variables use the `CACHEGATE_` prefix with `__` as the
    /// nesting separator, e.g. `CACHEGATE_CIRCUIT_BREAKER__FAILURE_THRESHOLD=3`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix("CACHEGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(
            enabled = settings.enabled,
            backend = %settings.backend,
            "Cache settings loaded"
        );
        Ok(settings)
    }

    /// Validate semantic constraints the type system cannot express
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.circuit_breaker
            .to_breaker_config()
            .validate()
            .map_err(ConfigurationError::Invalid)?;

        if self.local.max_capacity == 0 {
            return Err(ConfigurationError::Invalid(
                "local.max_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: "redis".to_string(),
            redis: None,
            local: LocalCacheSettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            keys: KeySettings::default(),
        }
    }
}

/// Distributed backend connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisSettings {
    /// Connection URL, e.g. `redis://localhost:6379/0`
    pub url: String,

    /// Timeout for establishing a connection
    pub connection_timeout_seconds: u64,

    /// Per-command response timeout; expiry here is what the breaker
    /// eventually counts as a timeout failure
    pub command_timeout_ms: u64,
}

impl RedisSettings {
    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    /// Get command timeout as Duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout_seconds: 5,
            command_timeout_ms: 500,
        }
    }
}

/// In-process fallback cache settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalCacheSettings {
    /// Maximum number of entries before eviction
    pub max_capacity: u64,

    /// Default TTL for entries; clamped to the local cache's 5-minute
    /// ceiling at construction
    pub default_ttl_seconds: u64,
}

impl LocalCacheSettings {
    /// Get default TTL as Duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

impl Default for LocalCacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl_seconds: 300,
        }
    }
}

/// Circuit breaker wire-format settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Consecutive connectivity failures before opening the circuit
    pub failure_threshold: u32,

    /// Open -> Half-Open delay
    pub reset_timeout_seconds: u64,

    /// Base backoff delay applied after a counted failure
    pub initial_backoff_ms: u64,

    /// Backoff multiplier per consecutive failure
    pub backoff_exponent: f64,

    /// Cap on a single backoff delay
    pub max_backoff_seconds: u64,
}

impl CircuitBreakerSettings {
    /// Convert wire-format settings into the runtime breaker configuration
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            reset_timeout: Duration::from_secs(self.reset_timeout_seconds),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            backoff_exponent: self.backoff_exponent,
            max_backoff: Duration::from_secs(self.max_backoff_seconds),
        }
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_seconds: 60,
            initial_backoff_ms: 100,
            backoff_exponent: 2.0,
            max_backoff_seconds: 30,
        }
    }
}

/// Key namespacing and TTL table settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KeySettings {
    /// Optional namespace prefix prepended to every key
    pub prefix: Option<String>,

    /// Per-key-type TTL table
    pub ttl: KeyTtlSettings,
}

/// TTL table by key type, in seconds.
///
/// `Permanent` keys have no entry - they never expire.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyTtlSettings {
    pub query_seconds: u64,
    pub session_seconds: u64,
    pub rate_limit_seconds: u64,
    pub file_seconds: u64,
    pub job_seconds: u64,
    pub token_seconds: u64,
    pub default_seconds: u64,
}

impl Default for KeyTtlSettings {
    fn default() -> Self {
        Self {
            query_seconds: 3_600,        // 1 hour
            session_seconds: 86_400,     // 24 hours
            rate_limit_seconds: 900,     // 15 minutes
            file_seconds: 86_400,        // 1 day
            job_seconds: 604_800,        // 7 days
            token_seconds: 900,          // 15 minutes
            default_seconds: 86_400,     // 24 hours
        }
    }
}
