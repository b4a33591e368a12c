//! # Cache Metrics
//!
//! OpenTelemetry instruments for cache server health, populated by the
//! periodic monitoring poller - never by the breaker's own call path.
//! The host application installs its own meter provider; without one the
//! global provider is a no-op and recording costs nothing.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::OnceLock;
use tracing::debug;

/// Lazy-initialized meter for cache metrics
static CACHE_METER: OnceLock<Meter> = OnceLock::new();

/// Get or initialize the cache meter
fn meter() -> &'static Meter {
    CACHE_METER.get_or_init(|| opentelemetry::global::meter_provider().meter("cachegate"))
}

/// Bytes of memory in use by the cache server
pub fn server_memory_used_bytes() -> Gauge<u64> {
    meter()
        .u64_gauge("cachegate.server.memory_used_bytes")
        .with_description("Bytes of memory in use by the cache server")
        .build()
}

/// Number of clients connected to the cache server
pub fn server_connected_clients() -> Gauge<u64> {
    meter()
        .u64_gauge("cachegate.server.connected_clients")
        .with_description("Number of clients connected to the cache server")
        .build()
}

/// Instantaneous cache server operations per second
pub fn server_ops_per_second() -> Gauge<u64> {
    meter()
        .u64_gauge("cachegate.server.ops_per_second")
        .with_description("Instantaneous cache server operations per second")
        .build()
}

/// Total cache errors observed, labeled by kind
///
/// Labels:
/// - kind: connection, timeout, backend, server_reported
pub fn cache_errors() -> Counter<u64> {
    meter()
        .u64_counter("cachegate.errors")
        .with_description("Total cache errors observed, by kind")
        .build()
}

/// Round-trip latency of the monitoring probe in milliseconds
pub fn probe_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("cachegate.probe.duration_ms")
        .with_description("Round-trip latency of the monitoring probe")
        .build()
}

/// Circuit breaker state (0 = closed, 1 = open, 2 = half-open)
pub fn circuit_state() -> Gauge<u64> {
    meter()
        .u64_gauge("cachegate.circuit.state")
        .with_description("Circuit breaker state (0=closed, 1=open, 2=half-open)")
        .build()
}

/// Static gauge: server_memory_used_bytes
pub static SERVER_MEMORY_USED_BYTES: OnceLock<Gauge<u64>> = OnceLock::new();

/// Static gauge: server_connected_clients
pub static SERVER_CONNECTED_CLIENTS: OnceLock<Gauge<u64>> = OnceLock::new();

/// Static gauge: server_ops_per_second
pub static SERVER_OPS_PER_SECOND: OnceLock<Gauge<u64>> = OnceLock::new();

/// Static counter: cache_errors
pub static CACHE_ERRORS: OnceLock<Counter<u64>> = OnceLock::new();

/// Static histogram: probe_duration_ms
pub static PROBE_DURATION_MS: OnceLock<Histogram<f64>> = OnceLock::new();

/// Static gauge: circuit_state
pub static CIRCUIT_STATE: OnceLock<Gauge<u64>> = OnceLock::new();

/// Initialize all cache metrics
///
/// Called once during application startup, after the host installs its
/// meter provider.
pub fn init() {
    SERVER_MEMORY_USED_BYTES.get_or_init(server_memory_used_bytes);
    SERVER_CONNECTED_CLIENTS.get_or_init(server_connected_clients);
    SERVER_OPS_PER_SECOND.get_or_init(server_ops_per_second);
    CACHE_ERRORS.get_or_init(cache_errors);
    PROBE_DURATION_MS.get_or_init(probe_duration_ms);
    CIRCUIT_STATE.get_or_init(circuit_state);

    debug!("Cache metrics initialized");
}
