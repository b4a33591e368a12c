//! Cache provider wiring with enum dispatch.
//!
//! Topology selection happens exactly once, here, from configuration:
//!
//! ```text
//! CacheProvider (enum)                      <- Zero-cost dispatch, no vtable
//!   ├── Distributed(ResilientCacheService)   <- Redis behind a circuit breaker
//!   ├── Disabled(ResilientCacheService)      <- NoOp client + null breaker
//!   └── Local(FallbackCacheService)          <- In-process cache, no breaker
//! ```
//!
//! Construction is graceful: a distributed backend that cannot be reached
//! at startup degrades to the local cache with a warning. Cache trouble
//! never blocks application startup.

use crate::cache::{CacheExpiration, FallbackCacheService, ResilientCacheService};
use crate::client::{CacheClient, NoOpCacheClient, RedisCacheClient};
use crate::config::CacheSettings;
use crate::errors::CacheResult;
use crate::resilience::{BreakerProvider, CircuitBreaker, CircuitState, NullCircuitBreaker};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Application-facing cache provider
///
/// The rest of the application depends on this type (plus the key
/// service) and nothing below it.
#[derive(Debug, Clone)]
pub enum CacheProvider {
    /// Redis-class store guarded by a circuit breaker
    Distributed(ResilientCacheService<RedisCacheClient>),
    /// Administratively disabled - null breaker, cache path never taken
    Disabled(ResilientCacheService<NoOpCacheClient>),
    /// In-process cache for deployments without a distributed store
    Local(FallbackCacheService),
}

impl CacheProvider {
    /// Build a provider from configuration with graceful degradation.
    ///
    /// Never fails: a misconfigured or unreachable distributed backend
    /// degrades (with a warning) instead of propagating an error.
    pub async fn from_config_graceful(settings: &CacheSettings) -> Self {
        if !settings.enabled {
            info!("Distributed cache disabled by configuration");
            return Self::disabled();
        }

        match settings.backend.as_str() {
            // "dragonfly" speaks the same protocol
            "redis" | "dragonfly" => Self::create_distributed(settings).await,
            "local" | "memory" | "in-memory" => {
                let service = FallbackCacheService::from_config(&settings.local);
                info!(backend = "local", "In-process cache provider initialized");
                Self::Local(service)
            }
            other => {
                warn!(backend = other, "Unknown cache backend, disabling cache");
                Self::disabled()
            }
        }
    }

    /// Attempt the distributed backend, degrading to the local cache on
    /// any startup failure
    async fn create_distributed(settings: &CacheSettings) -> Self {
        let Some(redis_settings) = &settings.redis else {
            warn!(
                "Redis cache enabled but no [redis] settings found, \
                 falling back to local cache"
            );
            return Self::Local(FallbackCacheService::from_config(&settings.local));
        };

        match RedisCacheClient::from_config(redis_settings).await {
            Ok(client) => {
                let breaker_config = settings.circuit_breaker.to_breaker_config();
                let breaker = BreakerProvider::Circuit(CircuitBreaker::new(
                    "cache".to_string(),
                    breaker_config,
                ));
                info!(
                    backend = "redis",
                    "Distributed cache provider initialized successfully"
                );
                Self::Distributed(ResilientCacheService::new(client, Arc::new(breaker)))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Failed to connect to Redis, falling back to local cache \
                     (graceful degradation)"
                );
                Self::Local(FallbackCacheService::from_config(&settings.local))
            }
        }
    }

    /// Provider with the cache path administratively off
    pub fn disabled() -> Self {
        Self::Disabled(ResilientCacheService::new(
            NoOpCacheClient::new(),
            Arc::new(BreakerProvider::Null(NullCircuitBreaker::new())),
        ))
    }

    /// Whether caching is actually on (not the disabled wiring)
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled(_))
    }

    /// Whether cache state is shared across instances.
    ///
    /// `true` for the distributed and disabled wirings (no local state to
    /// drift), `false` for the in-process cache.
    pub fn is_distributed(&self) -> bool {
        !matches!(self, Self::Local(_))
    }

    /// Get the provider name
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Distributed(service) => service.client().client_name(),
            Self::Disabled(_) => "noop",
            Self::Local(_) => "local",
        }
    }

    /// Current circuit state (`None` for the local cache, which has no
    /// breaker)
    pub fn circuit_state(&self) -> Option<CircuitState> {
        match self {
            Self::Distributed(service) => Some(service.circuit_state()),
            Self::Disabled(service) => Some(service.circuit_state()),
            Self::Local(_) => None,
        }
    }

    /// Get a cached value, or compute and cache it
    pub async fn get_or_create<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        expiration: CacheExpiration,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self {
            Self::Distributed(s) => s.get_or_create(key, factory, expiration).await,
            Self::Disabled(s) => s.get_or_create(key, factory, expiration).await,
            Self::Local(s) => s.get_or_create(key, factory, expiration).await,
        }
    }

    /// `get_or_create` for factories that may produce nothing
    pub async fn get_or_create_optional<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        expiration: CacheExpiration,
    ) -> CacheResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        match self {
            Self::Distributed(s) => s.get_or_create_optional(key, factory, expiration).await,
            Self::Disabled(s) => s.get_or_create_optional(key, factory, expiration).await,
            Self::Local(s) => s.get_or_create_optional(key, factory, expiration).await,
        }
    }

    /// Pure read; never computes
    pub async fn try_get_value<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self {
            Self::Distributed(s) => s.try_get_value(key).await,
            Self::Disabled(s) => s.try_get_value(key).await,
            Self::Local(s) => s.try_get_value(key).await,
        }
    }

    /// Best-effort write
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, expiration: CacheExpiration) {
        match self {
            Self::Distributed(s) => s.set(key, value, expiration).await,
            Self::Disabled(s) => s.set(key, value, expiration).await,
            Self::Local(s) => s.set(key, value, expiration).await,
        }
    }

    /// Best-effort removal
    pub async fn remove(&self, key: &str) {
        match self {
            Self::Distributed(s) => s.remove(key).await,
            Self::Disabled(s) => s.remove(key).await,
            Self::Local(s) => s.remove(key).await,
        }
    }

    /// Best-effort bulk removal by pattern
    pub async fn remove_pattern(&self, pattern: &str) -> u64 {
        match self {
            Self::Distributed(s) => s.remove_pattern(pattern).await,
            Self::Disabled(s) => s.remove_pattern(pattern).await,
            Self::Local(s) => s.remove_pattern(pattern).await,
        }
    }

    /// Liveness of the active cache path
    pub async fn health_check(&self) -> bool {
        match self {
            Self::Distributed(s) => s.health_check().await,
            Self::Disabled(s) => s.health_check().await,
            Self::Local(s) => s.health_check().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_settings_wire_null_breaker() {
        let settings = CacheSettings {
            enabled: false,
            ..CacheSettings::default()
        };
        let provider = CacheProvider::from_config_graceful(&settings).await;

        assert!(!provider.is_enabled());
        assert_eq!(provider.provider_name(), "noop");
        // Null breaker reports permanently open
        assert_eq!(provider.circuit_state(), Some(CircuitState::Open));
    }

    #[tokio::test]
    async fn test_disabled_provider_serves_factory() {
        let provider = CacheProvider::disabled();

        let value: u32 = provider
            .get_or_create(
                "user:42",
                || async { 12u32 },
                CacheExpiration::absolute(Duration::from_secs(60)),
            )
            .await
            .unwrap();
        assert_eq!(value, 12);

        let cached: Option<u32> = provider.try_get_value("user:42").await.unwrap();
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_local_backend() {
        let settings = CacheSettings {
            enabled: true,
            backend: "local".to_string(),
            ..CacheSettings::default()
        };
        let provider = CacheProvider::from_config_graceful(&settings).await;

        assert!(provider.is_enabled());
        assert!(!provider.is_distributed());
        assert_eq!(provider.provider_name(), "local");
        assert_eq!(provider.circuit_state(), None);

        provider
            .set(
                "user:1",
                &"v".to_string(),
                CacheExpiration::absolute(Duration::from_secs(60)),
            )
            .await;
        let cached: Option<String> = provider.try_get_value("user:1").await.unwrap();
        assert_eq!(cached, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_memory_alias_selects_local() {
        let settings = CacheSettings {
            enabled: true,
            backend: "in-memory".to_string(),
            ..CacheSettings::default()
        };
        let provider = CacheProvider::from_config_graceful(&settings).await;
        assert_eq!(provider.provider_name(), "local");
    }

    #[tokio::test]
    async fn test_unknown_backend_disables_cache() {
        let settings = CacheSettings {
            enabled: true,
            backend: "etcd".to_string(),
            ..CacheSettings::default()
        };
        let provider = CacheProvider::from_config_graceful(&settings).await;
        assert!(!provider.is_enabled());
    }

    #[tokio::test]
    async fn test_redis_without_settings_degrades_to_local() {
        let settings = CacheSettings {
            enabled: true,
            backend: "redis".to_string(),
            redis: None,
            ..CacheSettings::default()
        };
        let provider = CacheProvider::from_config_graceful(&settings).await;
        assert!(provider.is_enabled());
        assert_eq!(provider.provider_name(), "local");
    }

    #[tokio::test]
    async fn test_disabled_provider_health_check_is_false() {
        let provider = CacheProvider::disabled();
        assert!(!provider.health_check().await);
    }
}
