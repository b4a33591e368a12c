//! In-process fallback cache service.
//!
//! The same four-operation contract as the resilient service, backed by a
//! local `moka` cache instead of a distributed store. Used in topologies
//! that have no distributed cache to protect - so no circuit breaker is
//! ever consulted here.
//!
//! **Important**: this cache is NOT distributed. Each process keeps its own
//! state, and entry lifetime is clamped to five minutes to bound memory
//! growth regardless of the TTL a caller asks for.

use crate::cache::CacheExpiration;
use crate::config::LocalCacheSettings;
use crate::errors::CacheResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Ceiling on local entry lifetime
pub const MAX_LOCAL_TTL: Duration = Duration::from_secs(300);

/// Local in-memory cache service
///
/// All entries share the cache-level TTL fixed at construction time;
/// per-call expiration policies are accepted for contract compatibility
/// but the clamped cache-level TTL always wins.
#[derive(Clone)]
pub struct FallbackCacheService {
    cache: moka::future::Cache<String, String>,
}

impl std::fmt::Debug for FallbackCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCacheService")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .field("time_to_live", &self.cache.policy().time_to_live())
            .finish()
    }
}

impl FallbackCacheService {
    /// Create a fallback cache service from configuration
    pub fn from_config(settings: &LocalCacheSettings) -> Self {
        let ttl = settings.default_ttl().min(MAX_LOCAL_TTL);
        let cache = moka::future::Cache::builder()
            .max_capacity(settings.max_capacity)
            .time_to_live(ttl)
            .build();

        debug!(
            max_capacity = settings.max_capacity,
            ttl_seconds = ttl.as_secs(),
            "Fallback cache service created"
        );

        Self { cache }
    }

    /// Create with explicit capacity and TTL (for testing)
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self::from_config(&LocalCacheSettings {
            max_capacity,
            default_ttl_seconds: ttl.as_secs(),
        })
    }

    /// Get a cached value, or compute and cache it
    pub async fn get_or_create<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        _expiration: CacheExpiration,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.lookup::<T>(key).await {
            return Ok(value);
        }

        let value = factory().await;
        self.store(key, &value).await;
        Ok(value)
    }

    /// `get_or_create` for factories that may produce nothing; only `Some`
    /// results are cached
    pub async fn get_or_create_optional<T, F, Fut>(
        &self,
        key: &str,
        factory: F,
        _expiration: CacheExpiration,
    ) -> CacheResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if let Some(value) = self.lookup::<T>(key).await {
            return Ok(Some(value));
        }

        let value = factory().await;
        if let Some(ref present) = value {
            self.store(key, present).await;
        }
        Ok(value)
    }

    /// Pure read; `Ok(None)` on miss or undecodable payload
    pub async fn try_get_value<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        Ok(self.lookup(key).await)
    }

    /// Write a value; the clamped cache-level TTL applies regardless of
    /// the requested policy
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, _expiration: CacheExpiration) {
        self.store(key, value).await;
    }

    /// Remove a key
    pub async fn remove(&self, key: &str) {
        self.cache.invalidate(key).await;
        debug!(key = key, "Cache DEL (local)");
    }

    /// Pattern removal is not supported locally; entries age out via TTL
    pub async fn remove_pattern(&self, pattern: &str) -> u64 {
        debug!(
            pattern = pattern,
            "Pattern removal not supported for local cache, relying on TTL expiry"
        );
        0
    }

    /// The local cache is always reachable
    pub async fn health_check(&self) -> bool {
        true
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.cache.get(key).await?;
        match serde_json::from_str(&payload) {
            Ok(value) => {
                debug!(key = key, "Cache HIT (local)");
                Some(value)
            }
            Err(e) => {
                warn!(
                    key = key,
                    error = %e,
                    "Failed to deserialize local cache value, treating as miss"
                );
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to serialize value, skipping local set");
                return;
            }
        };
        self.cache.insert(key.to_string(), payload).await;
        debug!(key = key, "Cache SET (local)");
    }
}
