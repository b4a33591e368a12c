//! Shared test utilities: a scripted in-memory cache client.

use cachegate::cache::CacheExpiration;
use cachegate::client::{CacheClient, CacheServerStats};
use cachegate::errors::{CacheError, CacheResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory cache client whose connectivity can be scripted per test.
///
/// While `failing` is set, every operation returns a connection error -
/// the scenario tests flip it to simulate an outage and a recovery.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCacheClient {
    store: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
    get_attempts: Arc<AtomicU32>,
    set_attempts: Arc<AtomicU32>,
}

impl ScriptedCacheClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the simulated outage
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of times the backend was actually asked for a value
    pub fn get_attempts(&self) -> u32 {
        self.get_attempts.load(Ordering::SeqCst)
    }

    /// Number of times the backend was actually asked to store a value
    pub fn set_attempts(&self) -> u32 {
        self.set_attempts.load(Ordering::SeqCst)
    }

    pub fn insert_raw(&self, key: &str, payload: &str) {
        self.store
            .lock()
            .unwrap()
            .insert(key.to_string(), payload.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.lock().unwrap().contains_key(key)
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Connection("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

impl CacheClient for ScriptedCacheClient {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.get_attempts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.store.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _expiration: CacheExpiration) -> CacheResult<()> {
        self.set_attempts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.store
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.check()?;
        self.store.lock().unwrap().remove(key);
        Ok(())
    }

    async fn remove_pattern(&self, pattern: &str) -> CacheResult<u64> {
        self.check()?;
        let prefix = pattern.trim_end_matches('*');
        let mut store = self.store.lock().unwrap();
        let doomed: Vec<String> = store
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            store.remove(key);
        }
        Ok(doomed.len() as u64)
    }

    async fn refresh_ttl(&self, _key: &str, _ttl: Duration) -> CacheResult<()> {
        self.check()
    }

    async fn ping(&self) -> CacheResult<bool> {
        self.check()?;
        Ok(true)
    }

    async fn server_stats(&self) -> CacheResult<CacheServerStats> {
        self.check()?;
        Ok(CacheServerStats::default())
    }

    fn is_connected(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}
