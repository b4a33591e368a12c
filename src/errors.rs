//! Error types for the cachegate system.
//!
//! Cache-client failures are classified into a closed set of kinds at the
//! boundary where the backend library's errors are first caught. The circuit
//! breaker consults [`CacheError::is_connectivity`] and nothing else; error
//! messages never influence classification.

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Failed to reach the cache backend (refused, reset, unreachable)
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Cache operation timed out
    #[error("Cache operation timed out: {0}")]
    Timeout(String),

    /// Failed to serialize or deserialize a cache value
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// Malformed key-construction input (empty entity type or identifier)
    #[error("Invalid cache argument: {0}")]
    InvalidArgument(String),

    /// Unclassified backend error - rethrown unchanged, never counted
    /// against the circuit breaker
    #[error("Cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// Whether this error counts against the circuit breaker.
    ///
    /// Only connectivity-class failures (connection refusals, resets,
    /// timeouts) do. Everything else is the caller's problem, not the
    /// backend's availability.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Result type for cache operations
pub type CacheResult<T> = anyhow::Result<T, CacheError>;
