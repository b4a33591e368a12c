//! Deterministic cache key construction and TTL policy.
//!
//! Keys follow the grammar `[prefix:]entity_type:identifier[:sub_type][:parameter_hash]`,
//! all lowercase with spaces and dots folded to underscores. Identical
//! inputs always yield identical keys - cache hits depend on it.

use crate::config::{KeySettings, KeyTtlSettings};
use crate::errors::{CacheError, CacheResult};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Hash value used when no parameters are supplied
const DEFAULT_PARAMS_HASH: &str = "default";

/// Classification of a key, mapped to a recommended TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Query result caching
    Query,
    /// User session state
    Session,
    /// Rate limiting windows
    RateLimit,
    /// File metadata
    File,
    /// Background job state
    Job,
    /// Short-lived tokens
    Token,
    /// Never expires - removed only explicitly
    Permanent,
    /// Anything without a more specific classification
    Default,
}

/// Builds namespaced, deterministic cache keys and answers TTL lookups
#[derive(Debug, Clone)]
pub struct CacheKeyService {
    prefix: Option<String>,
    ttl: KeyTtlSettings,
}

impl CacheKeyService {
    /// Create a key service from settings; the prefix is normalized once
    /// so every key it appears in is consistent
    pub fn new(settings: KeySettings) -> Self {
        let prefix = settings
            .prefix
            .as_deref()
            .map(normalize)
            .filter(|p| !p.is_empty());

        Self {
            prefix,
            ttl: settings.ttl,
        }
    }

    /// Build a key from entity type, identifier, and optional sub-type.
    ///
    /// Fails with `InvalidArgument` when entity type or identifier is
    /// empty - a malformed key would silently break hit determinism.
    pub fn create_key(
        &self,
        entity_type: &str,
        identifier: &str,
        sub_type: Option<&str>,
    ) -> CacheResult<String> {
        let entity_type = normalize(entity_type);
        if entity_type.is_empty() {
            return Err(CacheError::InvalidArgument(
                "entity_type must not be empty".to_string(),
            ));
        }

        let identifier = normalize(identifier);
        if identifier.is_empty() {
            return Err(CacheError::InvalidArgument(
                "identifier must not be empty".to_string(),
            ));
        }

        let mut key = match &self.prefix {
            Some(prefix) => format!("{prefix}:{entity_type}:{identifier}"),
            None => format!("{entity_type}:{identifier}"),
        };

        if let Some(sub_type) = sub_type.map(normalize).filter(|s| !s.is_empty()) {
            key.push(':');
            key.push_str(&sub_type);
        }

        Ok(key)
    }

    /// Hash a parameter object into a fixed-length hex digest.
    ///
    /// Absent (or JSON-null) parameters hash to the literal `"default"`.
    /// Determinism holds because `serde_json`'s map is BTree-ordered, so
    /// structurally equal values always serialize to identical bytes.
    pub fn create_hash_from_params(&self, params: Option<&Value>) -> String {
        let value = match params {
            None | Some(Value::Null) => return DEFAULT_PARAMS_HASH.to_string(),
            Some(value) => value,
        };

        let canonical = value.to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        hex::encode(digest)
    }

    /// Key for a named query plus its parameter hash
    pub fn create_query_key(
        &self,
        query_name: &str,
        params: Option<&Value>,
    ) -> CacheResult<String> {
        let base = self.create_key("query", query_name, None)?;
        Ok(format!("{base}:{}", self.create_hash_from_params(params)))
    }

    /// Key for a user session
    pub fn create_session_key(&self, session_id: &str) -> CacheResult<String> {
        self.create_key("session", session_id, None)
    }

    /// Key for file metadata with an optional variant sub-type
    pub fn create_file_key(&self, file_id: &str, sub_type: Option<&str>) -> CacheResult<String> {
        self.create_key("file", file_id, sub_type)
    }

    /// Recommended TTL for a key type (`None` = never expires)
    pub fn expiration_for_key_type(&self, key_type: KeyType) -> Option<Duration> {
        let seconds = match key_type {
            KeyType::Query => self.ttl.query_seconds,
            KeyType::Session => self.ttl.session_seconds,
            KeyType::RateLimit => self.ttl.rate_limit_seconds,
            KeyType::File => self.ttl.file_seconds,
            KeyType::Job => self.ttl.job_seconds,
            KeyType::Token => self.ttl.token_seconds,
            KeyType::Permanent => return None,
            KeyType::Default => self.ttl.default_seconds,
        };
        Some(Duration::from_secs(seconds))
    }

    /// Inverse of `create_key`: the entity-type segment of a key.
    ///
    /// Strips the namespace prefix when present; a key with no colon is
    /// returned whole; empty input yields `None`.
    pub fn extract_entity_type_from_key(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }

        let unprefixed = match &self.prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .unwrap_or(key),
            None => key,
        };

        match unprefixed.split_once(':') {
            Some((entity_type, _)) => Some(entity_type.to_string()),
            None => Some(unprefixed.to_string()),
        }
    }

    /// Wildcard pattern matching every key of an entity type, for bulk
    /// scans by administrative tooling
    pub fn key_pattern_for_entity_type(&self, entity_type: &str) -> String {
        let entity_type = normalize(entity_type);
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{entity_type}:*"),
            None => format!("{entity_type}:*"),
        }
    }
}

/// Lowercase a key component and fold separators that would fragment the
/// colon-delimited grammar
fn normalize(component: &str) -> String {
    component.trim().to_lowercase().replace([' ', '.'], "_")
}
