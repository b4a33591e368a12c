//! # Circuit Breaker Configuration
//!
//! Runtime configuration for circuit breaker behavior. The wire-format
//! (seconds/milliseconds integers) lives in [`crate::config`]; this is the
//! `Duration`-typed form the breaker itself consumes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive connectivity failures before opening circuit
    pub failure_threshold: u32,

    /// Time to wait in open state before allowing a recovery probe
    pub reset_timeout: Duration,

    /// Base delay for the exponential backoff applied after each counted
    /// failure
    pub initial_backoff: Duration,

    /// Multiplier applied per consecutive failure
    pub backoff_exponent: f64,

    /// Upper bound on a single backoff delay
    pub max_backoff: Duration,
}

impl CircuitBreakerConfig {
    /// Create configuration tuned for a distributed cache dependency
    pub fn for_distributed_cache() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }

        if self.failure_threshold > 100 {
            return Err("failure_threshold should not exceed 100".to_string());
        }

        if self.reset_timeout.is_zero() {
            return Err("reset_timeout must be greater than 0".to_string());
        }

        if self.reset_timeout > Duration::from_secs(600) {
            return Err("reset_timeout should not exceed 600 seconds".to_string());
        }

        if self.backoff_exponent < 1.0 {
            return Err("backoff_exponent must be at least 1.0".to_string());
        }

        if self.max_backoff < self.initial_backoff {
            return Err("max_backoff must not be below initial_backoff".to_string());
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            initial_backoff: Duration::from_millis(100),
            backoff_exponent: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}
