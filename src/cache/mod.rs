//! # Cache Module
//!
//! The application-facing cache surface: a resilient facade over the
//! distributed store, a local fallback for single-node topologies, and a
//! deterministic key-namespacing service.
//!
//! ## Architecture
//!
//! ```text
//! CacheProvider (enum)                      <- Zero-cost dispatch, no vtable
//!   ├── Distributed(ResilientCacheService)   <- Redis behind a circuit breaker
//!   ├── Disabled(ResilientCacheService)      <- NoOp client + null breaker
//!   └── Local(FallbackCacheService)          <- In-process, 5-minute TTL clamp
//! ```
//!
//! ## Design Decisions
//!
//! - **Enum dispatch** for both topology and breaker selection
//! - **Best-effort writes**: cache errors logged but never propagated
//! - **Graceful degradation**: unreachable Redis at startup degrades to
//!   the local cache, never blocks startup
//! - **Factory as source of truth**: an unavailable cache transparently
//!   degrades `get_or_create` to the caller's compute function

pub mod expiration;
pub mod fallback;
pub mod keys;
pub mod provider;
pub mod resilient;

pub use expiration::CacheExpiration;
pub use fallback::{FallbackCacheService, MAX_LOCAL_TTL};
pub use keys::{CacheKeyService, KeyType};
pub use provider::CacheProvider;
pub use resilient::ResilientCacheService;
