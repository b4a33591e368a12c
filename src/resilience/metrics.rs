//! # Circuit Breaker Metrics
//!
//! Snapshot types for monitoring circuit breaker behavior. The breaker
//! maintains lock-free atomic counters on its hot path; [`CircuitBreakerMetrics`]
//! is the serializable view handed to monitoring and logging.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics snapshot for a single circuit breaker instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Total number of cache operations attempted through the breaker
    pub total_calls: u64,

    /// Number of successful cache operations
    pub success_count: u64,

    /// Number of counted (connectivity-class) failures
    pub failure_count: u64,

    /// Current consecutive failure count
    pub consecutive_failures: u64,

    /// Number of calls short-circuited to the fallback without touching
    /// the cache (open circuit or half-open probe already in flight)
    pub short_circuits: u64,

    /// Total duration of all attempted cache operations
    pub total_duration: Duration,

    /// Current circuit breaker state
    pub current_state: CircuitState,

    /// Calculated failure rate (0.0 to 1.0)
    pub failure_rate: f64,

    /// Calculated success rate (0.0 to 1.0)
    pub success_rate: f64,

    /// Average cache operation duration
    pub average_duration: Duration,
}

impl CircuitBreakerMetrics {
    /// Create new metrics instance with zero values
    pub fn new() -> Self {
        Self {
            total_calls: 0,
            success_count: 0,
            failure_count: 0,
            consecutive_failures: 0,
            short_circuits: 0,
            total_duration: Duration::ZERO,
            current_state: CircuitState::Closed,
            failure_rate: 0.0,
            success_rate: 0.0,
            average_duration: Duration::ZERO,
        }
    }

    /// Check if metrics indicate healthy operation
    pub fn is_healthy(&self) -> bool {
        match self.current_state {
            CircuitState::Closed => self.failure_rate < 0.1,
            CircuitState::Open => false,
            CircuitState::HalfOpen => true, // attempting recovery
        }
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Routing all calls to fallback",
            CircuitState::HalfOpen => "Recovering - Probing cache health",
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        format!(
            "State: {} | Calls: {} | Success: {:.1}% | Failures: {} | Short-circuits: {} | Avg Duration: {:.2}ms",
            self.state_description(),
            self.total_calls,
            self.success_rate * 100.0,
            self.failure_count,
            self.short_circuits,
            self.average_duration.as_millis()
        )
    }
}

impl Default for CircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zeroed() {
        let metrics = CircuitBreakerMetrics::new();
        assert_eq!(metrics.total_calls, 0);
        assert_eq!(metrics.failure_count, 0);
        assert_eq!(metrics.current_state, CircuitState::Closed);
        assert!(metrics.is_healthy());
    }

    #[test]
    fn test_open_circuit_is_unhealthy() {
        let metrics = CircuitBreakerMetrics {
            current_state: CircuitState::Open,
            ..CircuitBreakerMetrics::new()
        };
        assert!(!metrics.is_healthy());
    }

    #[test]
    fn test_closed_with_high_failure_rate_is_unhealthy() {
        let metrics = CircuitBreakerMetrics {
            failure_rate: 0.5,
            ..CircuitBreakerMetrics::new()
        };
        assert!(!metrics.is_healthy());
    }

    #[test]
    fn test_format_summary_mentions_state() {
        let metrics = CircuitBreakerMetrics::new();
        assert!(metrics.format_summary().contains("Normal operation"));
    }
}
