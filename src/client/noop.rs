//! No-op cache client.
//!
//! Satisfies the client contract when the distributed cache is
//! administratively disabled. The null circuit breaker never routes calls
//! here, but the wiring still needs a client-shaped object.

use crate::cache::CacheExpiration;
use crate::client::{CacheClient, CacheServerStats};
use crate::errors::CacheResult;
use std::time::Duration;

/// Cache client that stores nothing
///
/// All reads miss, all writes succeed silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCacheClient;

impl NoOpCacheClient {
    /// Create a new no-op cache client
    pub fn new() -> Self {
        Self
    }
}

impl CacheClient for NoOpCacheClient {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _expiration: CacheExpiration) -> CacheResult<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn remove_pattern(&self, _pattern: &str) -> CacheResult<u64> {
        Ok(0)
    }

    async fn refresh_ttl(&self, _key: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn ping(&self) -> CacheResult<bool> {
        Ok(true)
    }

    async fn server_stats(&self) -> CacheResult<CacheServerStats> {
        Ok(CacheServerStats::default())
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn client_name(&self) -> &'static str {
        "noop"
    }
}
