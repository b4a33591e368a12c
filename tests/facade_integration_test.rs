//! Key service + cache facade working together, plus provider wiring.

mod common;

use cachegate::cache::{CacheExpiration, CacheKeyService, CacheProvider, KeyType, ResilientCacheService};
use cachegate::config::{CacheSettings, KeySettings};
use cachegate::resilience::{BreakerProvider, CircuitBreaker, CircuitBreakerConfig, CircuitState};
use common::ScriptedCacheClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WorkoutSummary {
    user_id: u64,
    total_sessions: u32,
    favorite_exercise: String,
}

fn key_service() -> CacheKeyService {
    CacheKeyService::new(KeySettings {
        prefix: Some("fitness".to_string()),
        ..KeySettings::default()
    })
}

fn service(client: &ScriptedCacheClient) -> ResilientCacheService<ScriptedCacheClient> {
    ResilientCacheService::new(
        client.clone(),
        Arc::new(BreakerProvider::Circuit(CircuitBreaker::new(
            "cache".to_string(),
            CircuitBreakerConfig::default(),
        ))),
    )
}

#[tokio::test]
async fn test_keyed_round_trip_with_typed_value() {
    let keys = key_service();
    let client = ScriptedCacheClient::new();
    let cache = service(&client);

    let summary = WorkoutSummary {
        user_id: 42,
        total_sessions: 118,
        favorite_exercise: "deadlift".to_string(),
    };

    let key = keys.create_key("user", "42", Some("summary")).unwrap();
    assert_eq!(key, "fitness:user:42:summary");

    let ttl = keys.expiration_for_key_type(KeyType::Session).unwrap();
    cache
        .set(&key, &summary, CacheExpiration::absolute(ttl))
        .await;

    let cached: Option<WorkoutSummary> = cache.try_get_value(&key).await.unwrap();
    assert_eq!(cached, Some(summary.clone()));

    // get_or_create serves the cached value without computing
    let value: WorkoutSummary = cache
        .get_or_create(
            &key,
            || async { panic!("factory must not run on a hit") },
            CacheExpiration::absolute(ttl),
        )
        .await
        .unwrap();
    assert_eq!(value, summary);

    // And the key round-trips back to its entity type
    assert_eq!(
        keys.extract_entity_type_from_key(&key).as_deref(),
        Some("user")
    );
}

#[tokio::test]
async fn test_query_keys_partition_by_parameters() {
    let keys = key_service();
    let client = ScriptedCacheClient::new();
    let cache = service(&client);

    let page_one = keys
        .create_query_key("recent_workouts", Some(&json!({"user_id": 42, "page": 1})))
        .unwrap();
    let page_two = keys
        .create_query_key("recent_workouts", Some(&json!({"user_id": 42, "page": 2})))
        .unwrap();
    assert_ne!(page_one, page_two);

    let ttl = keys.expiration_for_key_type(KeyType::Query).unwrap();
    cache
        .set(&page_one, &vec![1u32, 2, 3], CacheExpiration::absolute(ttl))
        .await;

    let hit: Option<Vec<u32>> = cache.try_get_value(&page_one).await.unwrap();
    assert_eq!(hit, Some(vec![1, 2, 3]));
    let miss: Option<Vec<u32>> = cache.try_get_value(&page_two).await.unwrap();
    assert_eq!(miss, None);
}

#[tokio::test]
async fn test_entity_pattern_bulk_invalidation() {
    let keys = key_service();
    let client = ScriptedCacheClient::new();
    let cache = service(&client);
    let ttl = CacheExpiration::absolute(Duration::from_secs(60));

    for id in ["1", "2", "3"] {
        let key = keys.create_key("user", id, None).unwrap();
        cache.set(&key, &id.to_string(), ttl).await;
    }
    let session_key = keys.create_session_key("abc").unwrap();
    cache.set(&session_key, &"state".to_string(), ttl).await;

    let pattern = keys.key_pattern_for_entity_type("user");
    assert_eq!(pattern, "fitness:user:*");
    assert_eq!(cache.remove_pattern(&pattern).await, 3);

    // Sessions are untouched
    let still_there: Option<String> = cache.try_get_value(&session_key).await.unwrap();
    assert_eq!(still_there, Some("state".to_string()));
}

#[tokio::test]
async fn test_disabled_provider_end_to_end() {
    let settings = CacheSettings {
        enabled: false,
        ..CacheSettings::default()
    };
    let provider = CacheProvider::from_config_graceful(&settings).await;
    let keys = key_service();

    assert_eq!(provider.circuit_state(), Some(CircuitState::Open));

    let key = keys.create_session_key("abc").unwrap();
    let ttl = CacheExpiration::absolute(Duration::from_secs(60));

    // Every read computes; nothing sticks
    provider.set(&key, &"state".to_string(), ttl).await;
    let value: String = provider
        .get_or_create(&key, || async { "computed".to_string() }, ttl)
        .await
        .unwrap();
    assert_eq!(value, "computed");
}

#[tokio::test]
async fn test_local_provider_end_to_end() {
    let settings = CacheSettings {
        enabled: true,
        backend: "local".to_string(),
        ..CacheSettings::default()
    };
    let provider = CacheProvider::from_config_graceful(&settings).await;
    let keys = key_service();

    let key = keys
        .create_file_key("9001", Some("thumbnail"))
        .unwrap();
    let ttl = CacheExpiration::absolute(
        keys.expiration_for_key_type(KeyType::File).unwrap(),
    );

    let value: String = provider
        .get_or_create(&key, || async { "png-bytes".to_string() }, ttl)
        .await
        .unwrap();
    assert_eq!(value, "png-bytes");

    // Local population is synchronous, so the second read is a hit
    let cached: Option<String> = provider.try_get_value(&key).await.unwrap();
    assert_eq!(cached, Some("png-bytes".to_string()));
}
