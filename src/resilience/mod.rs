//! # Resilience Module
//!
//! Circuit breaker protection for the distributed cache dependency.
//!
//! ## Architecture
//!
//! ```text
//! BreakerProvider (enum)              <- Zero-cost dispatch, no vtable
//!   ├── Circuit(CircuitBreaker)        <- Three-state breaker with backoff
//!   └── Null(NullCircuitBreaker)       <- Always-fallback, cache disabled
//! ```
//!
//! The variant is chosen once at wiring time from configuration; the cache
//! services hold a `BreakerProvider` and never branch on an enabled flag.

pub mod circuit_breaker;
pub mod config;
pub mod metrics;
pub mod null;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;
pub use null::NullCircuitBreaker;

use crate::errors::CacheResult;
use std::future::Future;

/// Breaker selection with enum dispatch
///
/// `Circuit` wraps real three-state protection; `Null` is the
/// administratively-disabled stand-in that always takes the fallback path.
#[derive(Debug)]
pub enum BreakerProvider {
    /// Real circuit breaker protection
    Circuit(CircuitBreaker),
    /// Degraded mode - cache path never taken
    Null(NullCircuitBreaker),
}

impl BreakerProvider {
    /// Current circuit state (`Null` always reports `Open`)
    pub fn state(&self) -> CircuitState {
        match self {
            Self::Circuit(cb) => cb.state(),
            Self::Null(nb) => nb.state(),
        }
    }

    /// Execute a cache operation through the selected breaker
    pub async fn execute<T, C, CF, F, FF>(&self, cache_op: C, fallback: F) -> CacheResult<T>
    where
        C: FnOnce() -> CF,
        CF: Future<Output = CacheResult<T>>,
        F: FnOnce() -> FF,
        FF: Future<Output = T>,
    {
        match self {
            Self::Circuit(cb) => cb.execute(cache_op, fallback).await,
            Self::Null(nb) => nb.execute(cache_op, fallback).await,
        }
    }

    /// Force the circuit open (no-op for the null breaker, which is
    /// already permanently open)
    pub fn force_open(&self) {
        if let Self::Circuit(cb) = self {
            cb.force_open();
        }
    }

    /// Force the circuit closed (no-op for the null breaker)
    pub fn force_closed(&self) {
        if let Self::Circuit(cb) = self {
            cb.force_closed();
        }
    }

    /// Metrics snapshot (`None` for the null breaker, which counts nothing)
    pub fn metrics(&self) -> Option<CircuitBreakerMetrics> {
        match self {
            Self::Circuit(cb) => Some(cb.metrics()),
            Self::Null(_) => None,
        }
    }
}
