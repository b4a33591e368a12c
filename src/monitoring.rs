//! # Cache Monitoring Collaborator
//!
//! Periodically polls cache server statistics and republishes them as
//! OpenTelemetry metrics. Consumes the same client object as the cache
//! services but is not part of the resilience contract - the breaker
//! judges availability purely from call outcomes, never from here.

use crate::client::CacheClient;
use crate::errors::CacheError;
use crate::metrics;
use crate::resilience::{BreakerProvider, CircuitState};
use opentelemetry::KeyValue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Metric label for an error kind
fn error_kind_label(error: &CacheError) -> &'static str {
    match error {
        CacheError::Connection(_) => "connection",
        CacheError::Timeout(_) => "timeout",
        CacheError::Serialization(_) => "serialization",
        CacheError::InvalidArgument(_) => "invalid_argument",
        CacheError::Backend(_) => "backend",
    }
}

/// Periodic cache statistics poller
///
/// Exports server gauges, an error counter, the probe round-trip
/// histogram, and (when a breaker is wired) the circuit state gauge.
#[derive(Debug, Clone)]
pub struct CacheStatsMonitor<C: CacheClient + Clone + 'static> {
    client: C,
    breaker: Option<Arc<BreakerProvider>>,
    last_total_errors: Arc<AtomicU64>,
}

impl<C: CacheClient + Clone + 'static> CacheStatsMonitor<C> {
    /// Create a monitor over a client and an optional breaker to observe
    pub fn new(client: C, breaker: Option<Arc<BreakerProvider>>) -> Self {
        metrics::init();
        Self {
            client,
            breaker,
            last_total_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Poll once and export every instrument
    pub async fn export_snapshot(&self) {
        let labels = &[KeyValue::new("client", self.client.client_name())];

        // Probe round-trip, also the liveness signal for the histogram
        let started = Instant::now();
        match self.client.ping().await {
            Ok(_) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
                metrics::PROBE_DURATION_MS
                    .get_or_init(metrics::probe_duration_ms)
                    .record(elapsed_ms, labels);
            }
            Err(e) => {
                metrics::CACHE_ERRORS
                    .get_or_init(metrics::cache_errors)
                    .add(
                        1,
                        &[KeyValue::new("kind", error_kind_label(&e))],
                    );
                warn!(error = %e, "Cache monitoring probe failed");
            }
        }

        match self.client.server_stats().await {
            Ok(stats) => {
                metrics::SERVER_MEMORY_USED_BYTES
                    .get_or_init(metrics::server_memory_used_bytes)
                    .record(stats.memory_used_bytes, labels);
                metrics::SERVER_CONNECTED_CLIENTS
                    .get_or_init(metrics::server_connected_clients)
                    .record(stats.connected_clients, labels);
                metrics::SERVER_OPS_PER_SECOND
                    .get_or_init(metrics::server_ops_per_second)
                    .record(stats.ops_per_second, labels);

                // The server reports a cumulative total; export the delta
                let previous = self
                    .last_total_errors
                    .swap(stats.total_errors, Ordering::Relaxed);
                let delta = stats.total_errors.saturating_sub(previous);
                if delta > 0 {
                    metrics::CACHE_ERRORS
                        .get_or_init(metrics::cache_errors)
                        .add(delta, &[KeyValue::new("kind", "server_reported")]);
                }

                debug!(
                    memory_used_bytes = stats.memory_used_bytes,
                    connected_clients = stats.connected_clients,
                    ops_per_second = stats.ops_per_second,
                    transport_connected = self.client.is_connected(),
                    "Exported cache server metrics snapshot"
                );
            }
            Err(e) => {
                metrics::CACHE_ERRORS
                    .get_or_init(metrics::cache_errors)
                    .add(1, &[KeyValue::new("kind", error_kind_label(&e))]);
                warn!(error = %e, "Cache server stats poll failed");
            }
        }

        if let Some(breaker) = &self.breaker {
            let state_value = match breaker.state() {
                CircuitState::Closed => 0,
                CircuitState::Open => 1,
                CircuitState::HalfOpen => 2,
            };
            metrics::CIRCUIT_STATE
                .get_or_init(metrics::circuit_state)
                .record(state_value, labels);
        }
    }

    /// Start polling in the background at the given interval.
    ///
    /// Returns a handle the host can abort at shutdown.
    pub fn start_periodic_export(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.export_snapshot().await;
            }
        })
    }
}
