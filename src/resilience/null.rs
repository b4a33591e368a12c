//! Null-object circuit breaker.
//!
//! Used when the distributed cache is administratively disabled: the same
//! `execute` contract, but the cache path is never taken and nothing is
//! counted or probed. Selecting this variant at wiring time keeps all
//! conditional logic out of the cache services themselves.

use crate::errors::CacheResult;
use crate::resilience::CircuitState;
use std::future::Future;
use tracing::debug;

/// Circuit breaker stand-in that always routes to the fallback.
///
/// Reports `Open` so monitoring reflects that the cache path is inactive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCircuitBreaker;

impl NullCircuitBreaker {
    /// Create a new null circuit breaker
    pub fn new() -> Self {
        Self
    }

    /// Always `Open` - the cache path is never taken
    pub fn state(&self) -> CircuitState {
        CircuitState::Open
    }

    /// Execute the fallback directly; the cache operation is dropped unrun.
    pub async fn execute<T, C, CF, F, FF>(&self, _cache_op: C, fallback: F) -> CacheResult<T>
    where
        C: FnOnce() -> CF,
        CF: Future<Output = CacheResult<T>>,
        F: FnOnce() -> FF,
        FF: Future<Output = T>,
    {
        debug!("Cache disabled, executing fallback directly");
        Ok(fallback().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CacheError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_null_breaker_reports_open() {
        let breaker = NullCircuitBreaker::new();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_null_breaker_always_runs_fallback() {
        let breaker = NullCircuitBreaker::new();
        let attempts = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let attempts = Arc::clone(&attempts);
            let result = breaker
                .execute(
                    move || async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CacheError>(1u32)
                    },
                    || async { 42u32 },
                )
                .await;
            assert_eq!(result.unwrap(), 42);
        }

        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
