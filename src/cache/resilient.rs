//! Resilient cache facade over the distributed store.
//!
//! The four-operation cache API the rest of the application consumes.
//! Every piece of cache I/O goes through the injected circuit breaker;
//! when the store is slow, unreachable, or flapping, calls degrade to the
//! caller-supplied compute path instead of surfacing failures. Caching is
//! best-effort throughout - a healthy page render never depends on it.

use crate::cache::CacheExpiration;
use crate::client::CacheClient;
use crate::errors::CacheResult;
use crate::resilience::{BreakerProvider, CircuitState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Circuit-breaker-protected cache service
///
/// Generic over the client so breaker semantics are testable without a
/// live server. Values are stored as UTF-8 JSON text.
#[derive(Debug, Clone)]
pub struct ResilientCacheService<C: CacheClient + Clone + 'static> {
    client: C,
    breaker: Arc<BreakerProvider>,
}

impl<C: CacheClient + Clone + 'static> ResilientCacheService<C> {
    /// Create a service over a client and an explicitly wired breaker
    pub fn new(client: C, breaker: Arc<BreakerProvider>) -> Self {
        Self { client, breaker }
    }

    /// Get a cached value, or compute and cache it.
    ///
    /// On a hit the deserialized value is returned directly. On a miss -
    /// or whenever the breaker routes around the cache - `factory` is the
    /// source of truth; its result is returned immediately while the cache
    /// is populated in the background. A sliding entry's TTL is refreshed
    /// on hits.
    ///
    /// `Err` only for unclassified backend errors; cache unavailability
    /// never surfaces here.
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
        if let Some(value) = self.read_through::<T>(key, expiration).await? {
            return Ok(value);
        }

        let value = factory().await;
        self.populate(key, &value, expiration);
        Ok(value)
    }

    /// `get_or_create` for factories that may produce nothing.
    ///
    /// Only `Some` results are cached, so a missing upstream entity is
    /// recomputed on the next call instead of pinning a JSON `null`.
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
        if let Some(value) = self.read_through::<T>(key, expiration).await? {
            return Ok(Some(value));
        }

        let value = factory().await;
        if let Some(ref present) = value {
            self.populate(key, present, expiration);
        }
        Ok(value)
    }

    /// Pure read: `Ok(None)` on miss, open circuit, or an undecodable
    /// payload. Never computes anything and never extends TTLs.
    pub async fn try_get_value<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let cached = self
            .breaker
            .execute(|| self.client.get(key), || async { None })
            .await?;

        let Some(payload) = cached else {
            return Ok(None);
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    key = key,
                    error = %e,
                    "Failed to deserialize cached value, treating as miss"
                );
                Ok(None)
            }
        }
    }

    /// Write a value through the breaker. Best-effort: every failure is
    /// logged and swallowed.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, expiration: CacheExpiration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to serialize value, skipping cache set");
                return;
            }
        };

        let result = self
            .breaker
            .execute(|| self.client.set(key, &payload, expiration), || async {})
            .await;
        if let Err(e) = result {
            warn!(key = key, error = %e, "Cache set skipped");
        }
    }

    /// Remove a key. Best-effort, same semantics as `set`.
    pub async fn remove(&self, key: &str) {
        let result = self
            .breaker
            .execute(|| self.client.remove(key), || async {})
            .await;
        if let Err(e) = result {
            warn!(key = key, error = %e, "Cache remove skipped");
        }
    }

    /// Remove every key matching a pattern (administrative bulk
    /// invalidation). Returns the number of keys removed; 0 when the
    /// cache path is unavailable.
    pub async fn remove_pattern(&self, pattern: &str) -> u64 {
        let result = self
            .breaker
            .execute(|| self.client.remove_pattern(pattern), || async { 0 })
            .await;
        match result {
            Ok(removed) => removed,
            Err(e) => {
                warn!(pattern = pattern, error = %e, "Cache pattern remove skipped");
                0
            }
        }
    }

    /// Liveness of the cache path; `false` while the circuit is open
    pub async fn health_check(&self) -> bool {
        self.breaker
            .execute(|| self.client.ping(), || async { false })
            .await
            .unwrap_or(false)
    }

    /// Current circuit state
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// The wired breaker (for monitoring)
    pub fn breaker(&self) -> &Arc<BreakerProvider> {
        &self.breaker
    }

    /// The underlying client (for monitoring)
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Breaker-routed read plus decode; sliding hits refresh their TTL
    async fn read_through<T: DeserializeOwned>(
        &self,
        key: &str,
        expiration: CacheExpiration,
    ) -> CacheResult<Option<T>> {
        let cached = self
            .breaker
            .execute(|| self.client.get(key), || async { None })
            .await?;

        let Some(payload) = cached else {
            return Ok(None);
        };

        match serde_json::from_str(&payload) {
            Ok(value) => {
                debug!(key = key, "Resilient cache hit");
                if let CacheExpiration::Sliding(window) = expiration {
                    let touch = self
                        .breaker
                        .execute(|| self.client.refresh_ttl(key, window), || async {})
                        .await;
                    if let Err(e) = touch {
                        warn!(key = key, error = %e, "Sliding TTL refresh skipped");
                    }
                }
                Ok(Some(value))
            }
            Err(e) => {
                warn!(
                    key = key,
                    error = %e,
                    "Failed to deserialize cached value, treating as miss"
                );
                Ok(None)
            }
        }
    }

    /// Fire-and-forget cache population after a factory run
    fn populate<T: Serialize>(&self, key: &str, value: &T, expiration: CacheExpiration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to serialize value, skipping population");
                return;
            }
        };

        let client = self.client.clone();
        let breaker = Arc::clone(&self.breaker);
        let key = key.to_string();
        tokio::spawn(async move {
            let result = breaker
                .execute(|| client.set(&key, &payload, expiration), || async {})
                .await;
            match result {
                Ok(()) => debug!(key = %key, "Cache populated"),
                Err(e) => warn!(key = %key, error = %e, "Cache population skipped"),
            }
        });
    }
}
