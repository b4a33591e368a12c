#![allow(clippy::doc_markdown)] // Allow technical terms like Redis, TTL in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # cachegate
//!
//! Resilient distributed-cache layer: the subsystem that keeps an
//! application responsive when its external cache is slow, unreachable,
//! or flapping.
//!
//! ## Overview
//!
//! Page requests should never hang on a sick cache. cachegate wraps every
//! cache call in a three-state circuit breaker (Closed / Open / Half-Open)
//! with failure counting, timed recovery probing, and jittered exponential
//! backoff. When the cache path is unavailable, reads transparently
//! degrade to the caller-supplied compute function and writes become
//! logged no-ops - resilience failures are recovered locally and never
//! surface to the end user.
//!
//! ## Module Organization
//!
//! - [`cache`] - Resilient cache facade, local fallback, key service
//! - [`client`] - Cache client connection contract and implementations
//! - [`resilience`] - Circuit breaker patterns and fault tolerance
//! - [`config`] - Configuration management
//! - [`errors`] - Structured error handling
//! - [`metrics`] - OpenTelemetry instruments
//! - [`monitoring`] - Periodic server-statistics poller
//! - [`logging`] - Tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachegate::cache::{CacheExpiration, CacheProvider};
//! use cachegate::config::CacheSettings;
//! use std::time::Duration;
//!
//! # async fn example() -> cachegate::errors::CacheResult<()> {
//! let settings = CacheSettings::load(None).expect("valid settings");
//! let cache = CacheProvider::from_config_graceful(&settings).await;
//!
//! let workouts: Vec<String> = cache
//!     .get_or_create(
//!         "query:recent_workouts:default",
//!         || async { vec!["deadlift".to_string()] },
//!         CacheExpiration::absolute(Duration::from_secs(3600)),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Wiring
//!
//! Topology is chosen once, from configuration: a Redis-class store
//! behind a real breaker, a null breaker when caching is administratively
//! disabled, or a local in-process cache for single-node deployments.
//! The selection is enum dispatch - application code never branches on
//! an enabled flag.

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod monitoring;
pub mod resilience;

pub use cache::{
    CacheExpiration, CacheKeyService, CacheProvider, FallbackCacheService, KeyType,
    ResilientCacheService,
};
pub use client::{CacheClient, CacheServerStats, NoOpCacheClient, RedisCacheClient};
pub use config::{CacheSettings, CircuitBreakerSettings, ConfigurationError, KeySettings};
pub use errors::{CacheError, CacheResult};
pub use monitoring::CacheStatsMonitor;
pub use resilience::{
    BreakerProvider, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState,
    NullCircuitBreaker,
};
