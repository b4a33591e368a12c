//! End-to-end circuit breaker scenarios through the resilient cache
//! facade, driven by a scripted backend outage.
//!
//! The attempt-counting scenarios use `try_get_value` (a pure read with no
//! background population) so every backend attempt is accounted for
//! deterministically.

mod common;

use cachegate::cache::{CacheExpiration, ResilientCacheService};
use cachegate::resilience::{BreakerProvider, CircuitBreaker, CircuitBreakerConfig, CircuitState};
use common::ScriptedCacheClient;
use std::sync::Arc;
use std::time::Duration;

fn breaker(failure_threshold: u32, reset_timeout: Duration) -> Arc<BreakerProvider> {
    Arc::new(BreakerProvider::Circuit(CircuitBreaker::new(
        "cache".to_string(),
        CircuitBreakerConfig {
            failure_threshold,
            reset_timeout,
            initial_backoff: Duration::from_millis(1),
            backoff_exponent: 2.0,
            max_backoff: Duration::from_millis(4),
        },
    )))
}

fn expiration() -> CacheExpiration {
    CacheExpiration::absolute(Duration::from_secs(60))
}

async fn read(service: &ResilientCacheService<ScriptedCacheClient>) -> Option<u32> {
    service.try_get_value("query:plan").await.unwrap()
}

#[tokio::test]
async fn test_outage_opens_after_threshold_and_probes_once_after_window() {
    let client = ScriptedCacheClient::new();
    let breaker = breaker(3, Duration::from_millis(100));
    let service = ResilientCacheService::new(client.clone(), Arc::clone(&breaker));

    client.insert_raw("query:plan", "11");
    client.set_failing(true);

    // Three consecutive connectivity failures open the circuit; every call
    // still degrades to a miss instead of surfacing an error.
    for call in 1..=3u32 {
        assert_eq!(read(&service).await, None, "call {call} must degrade");
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    assert_eq!(client.get_attempts(), 3);

    // A 4th call inside the reset window short-circuits: no new attempt.
    assert_eq!(read(&service).await, None);
    assert_eq!(client.get_attempts(), 3);

    // Backend recovers; once the window elapses the 5th call makes exactly
    // one probe, which succeeds, closes the circuit, and serves the value.
    client.set_failing(false);
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(read(&service).await, Some(11));
    assert_eq!(client.get_attempts(), 4);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_failed_probe_restarts_the_reset_window() {
    let client = ScriptedCacheClient::new();
    let breaker = breaker(2, Duration::from_millis(80));
    let service = ResilientCacheService::new(client.clone(), Arc::clone(&breaker));

    client.set_failing(true);

    for _ in 0..2 {
        assert_eq!(read(&service).await, None);
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    let attempts_when_opened = client.get_attempts();

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Still down: the probe fails and the circuit reopens.
    assert_eq!(read(&service).await, None);
    assert_eq!(client.get_attempts(), attempts_when_opened + 1);
    assert_eq!(breaker.state(), CircuitState::Open);

    // Immediately after the failed probe the fresh window blocks attempts.
    assert_eq!(read(&service).await, None);
    assert_eq!(client.get_attempts(), attempts_when_opened + 1);
}

#[tokio::test]
async fn test_outage_degrades_get_or_create_to_factory() {
    let client = ScriptedCacheClient::new();
    let breaker = breaker(2, Duration::from_secs(60));
    let service = ResilientCacheService::new(client.clone(), Arc::clone(&breaker));

    client.insert_raw("query:plan", "11");
    client.set_failing(true);

    // The cached 11 is unreachable, so the factory answers every time.
    for _ in 0..3 {
        let value: u32 = service
            .get_or_create("query:plan", || async { 99u32 }, expiration())
            .await
            .unwrap();
        assert_eq!(value, 99);
    }
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_writes_never_surface_during_outage() {
    let client = ScriptedCacheClient::new();
    let breaker = breaker(3, Duration::from_secs(60));
    let service = ResilientCacheService::new(client.clone(), Arc::clone(&breaker));

    client.set_failing(true);

    // None of these may panic or error
    service.set("user:1", &1u32, expiration()).await;
    service.remove("user:1").await;
    assert_eq!(service.remove_pattern("user:*").await, 0);
    assert_eq!(breaker.state(), CircuitState::Open);

    // Open circuit: writes are skipped without touching the backend
    let sets_before = client.set_attempts();
    service.set("user:2", &2u32, expiration()).await;
    assert_eq!(client.set_attempts(), sets_before);
}
