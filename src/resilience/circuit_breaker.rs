//! # Circuit Breaker Implementation
//!
//! Fault isolation for the distributed cache dependency, following the
//! classic three-state pattern: Closed (normal operation), Open (failing
//! fast to the fallback), and Half-Open (probing recovery).
//!
//! Every call carries both a cache operation and a fallback operation.
//! Connectivity-class failures are absorbed: they are counted, throttled
//! with exponential backoff, and answered from the fallback. Any other
//! error is rethrown unchanged - the breaker shields against availability
//! problems, not programming errors.

use crate::errors::{CacheError, CacheResult};
use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

/// Lock-free atomic counters for circuit breaker metrics.
///
/// Keeps `record_success`/`record_failure` off the mutex in the hot path.
#[derive(Debug)]
struct AtomicBreakerCounters {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    short_circuits: AtomicU64,
    total_duration_nanos: AtomicU64,
}

impl AtomicBreakerCounters {
    fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            short_circuits: AtomicU64::new(0),
            total_duration_nanos: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_success(&self, duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_failure(&self, duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.total_duration_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    #[inline]
    fn record_short_circuit(&self) {
        self.short_circuits.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, state: CircuitState, consecutive_failures: u64) -> CircuitBreakerMetrics {
        let total_calls = self.total_calls.load(Ordering::Relaxed);
        let success_count = self.success_count.load(Ordering::Relaxed);
        let failure_count = self.failure_count.load(Ordering::Relaxed);
        let total_duration_nanos = self.total_duration_nanos.load(Ordering::Relaxed);
        let total_duration = Duration::from_nanos(total_duration_nanos);

        let (failure_rate, success_rate, average_duration) = if total_calls > 0 {
            let fr = failure_count as f64 / total_calls as f64;
            let sr = success_count as f64 / total_calls as f64;
            let avg = if success_count > 0 {
                Duration::from_nanos(total_duration_nanos / success_count)
            } else {
                Duration::ZERO
            };
            (fr, sr, avg)
        } else {
            (0.0, 0.0, Duration::ZERO)
        };

        CircuitBreakerMetrics {
            total_calls,
            success_count,
            failure_count,
            consecutive_failures,
            short_circuits: self.short_circuits.load(Ordering::Relaxed),
            total_duration,
            current_state: state,
            failure_rate,
            success_rate,
            average_duration,
        }
    }
}

/// Get current epoch nanos from SystemTime
#[inline]
fn epoch_nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos() as u64
}

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - cache operations are attempted
    Closed = 0,
    /// Failure mode - calls route straight to the fallback
    Open = 1,
    /// Testing recovery - a single probe is allowed through
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

/// State mutated only inside the critical section.
///
/// `failure_count` is the consecutive-failure tally since the last
/// successful call or reset; `probe_in_flight` serializes half-open probes.
#[derive(Debug)]
struct BreakerShared {
    failure_count: u32,
    last_failure_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Circuit breaker guarding calls to the distributed cache.
///
/// One instance is shared per external cache connection, constructed at
/// wiring time and injected into the services that need it - there is no
/// ambient global.
///
/// State transitions happen inside a narrow mutex-guarded critical section;
/// the fail-fast read of `state` is a lock-free atomic load and may be
/// stale by at most one in-flight transition, which is harmless.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Current circuit state (atomic mirror for the lock-free read path)
    state: AtomicU8,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    /// Epoch nanos when circuit was opened (0 = not open)
    opened_at_epoch_nanos: AtomicU64,

    /// Mutex-guarded transition state
    shared: Mutex<BreakerShared>,

    /// Lock-free call counters
    counters: AtomicBreakerCounters,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_seconds = config.reset_timeout.as_secs(),
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            opened_at_epoch_nanos: AtomicU64::new(0),
            shared: Mutex::new(BreakerShared {
                failure_count: 0,
                last_failure_at: None,
                probe_in_flight: false,
            }),
            counters: AtomicBreakerCounters::new(),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute a cache operation with circuit breaker protection.
    ///
    /// Connectivity-class failures are counted, throttled with jittered
    /// exponential backoff, and answered by `fallback`. While the circuit
    /// is open, `cache_op` is never invoked and `fallback` answers
    /// immediately with no delay. Any non-connectivity error from
    /// `cache_op` is returned unchanged without touching circuit state.
    pub async fn execute<T, C, CF, F, FF>(&self, cache_op: C, fallback: F) -> CacheResult<T>
    where
        C: FnOnce() -> CF,
        CF: Future<Output = CacheResult<T>>,
        F: FnOnce() -> FF,
        FF: Future<Output = T>,
    {
        let mut probing = false;

        match self.state() {
            CircuitState::Closed => {}
            CircuitState::Open => {
                if !self.reset_window_elapsed() {
                    self.counters.record_short_circuit();
                    debug!(component = %self.name, "Circuit open, short-circuiting to fallback");
                    return Ok(fallback().await);
                }
                if self.try_begin_probe() {
                    probing = true;
                } else {
                    self.counters.record_short_circuit();
                    return Ok(fallback().await);
                }
            }
            CircuitState::HalfOpen => {
                if self.try_begin_probe() {
                    probing = true;
                } else {
                    self.counters.record_short_circuit();
                    debug!(component = %self.name, "Probe already in flight, using fallback");
                    return Ok(fallback().await);
                }
            }
        }

        let start = Instant::now();
        let result = cache_op().await;
        let duration = start.elapsed();

        match result {
            Ok(value) => {
                self.on_success(duration, probing);
                Ok(value)
            }
            Err(e) if e.is_connectivity() => {
                let delay = self.on_failure(duration, probing, &e);
                tokio::time::sleep(delay).await;
                Ok(fallback().await)
            }
            Err(e) => {
                // Not an availability problem; the circuit stays as it was.
                if probing {
                    self.abort_probe();
                }
                Err(e)
            }
        }
    }

    /// Whether the open circuit's reset window has elapsed
    fn reset_window_elapsed(&self) -> bool {
        let opened_nanos = self.opened_at_epoch_nanos.load(Ordering::Acquire);
        if opened_nanos == 0 {
            warn!(component = %self.name, "Circuit open but no timestamp recorded");
            return true;
        }

        let elapsed_nanos = epoch_nanos_now().saturating_sub(opened_nanos);
        elapsed_nanos >= self.config.reset_timeout.as_nanos() as u64
    }

    /// Claim the half-open probe slot, transitioning Open -> HalfOpen when
    /// the reset window has elapsed. Returns false if another task holds
    /// the probe.
    fn try_begin_probe(&self) -> bool {
        let mut shared = self.shared.lock();

        match self.state() {
            CircuitState::Open => {
                if !self.reset_window_elapsed() {
                    return false;
                }
                shared.probe_in_flight = true;
                let idle_ms = shared
                    .last_failure_at
                    .map(|at| at.elapsed().as_millis() as u64);
                self.state
                    .store(CircuitState::HalfOpen as u8, Ordering::Release);
                info!(
                    component = %self.name,
                    idle_ms = idle_ms,
                    "Circuit breaker half-open (probing recovery)"
                );
                true
            }
            CircuitState::HalfOpen => {
                if shared.probe_in_flight {
                    false
                } else {
                    shared.probe_in_flight = true;
                    true
                }
            }
            // Raced with a concurrent recovery; proceed as a normal call.
            CircuitState::Closed => true,
        }
    }

    /// Release the probe slot without recording an outcome (unclassified
    /// error during a probe)
    fn abort_probe(&self) {
        let mut shared = self.shared.lock();
        shared.probe_in_flight = false;
    }

    /// Record a successful cache operation
    fn on_success(&self, duration: Duration, probing: bool) {
        self.counters.record_success(duration);

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis(),
            "Cache operation succeeded"
        );

        let mut shared = self.shared.lock();
        if probing {
            shared.probe_in_flight = false;
        }
        shared.failure_count = 0;

        match self.state() {
            CircuitState::HalfOpen => {
                self.opened_at_epoch_nanos.store(0, Ordering::Release);
                self.state
                    .store(CircuitState::Closed as u8, Ordering::Release);
                info!(component = %self.name, "Circuit breaker closed (recovered)");
            }
            CircuitState::Closed => {}
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a counted failure and return the backoff delay to apply
    /// before the fallback runs
    fn on_failure(&self, duration: Duration, probing: bool, err: &CacheError) -> Duration {
        self.counters.record_failure(duration);

        let mut shared = self.shared.lock();
        shared.failure_count = shared.failure_count.saturating_add(1);
        shared.last_failure_at = Some(Instant::now());
        if probing {
            shared.probe_in_flight = false;
        }
        let failures = shared.failure_count;

        match self.state() {
            CircuitState::HalfOpen => {
                self.opened_at_epoch_nanos
                    .store(epoch_nanos_now(), Ordering::Release);
                self.state
                    .store(CircuitState::Open as u8, Ordering::Release);
                error!(
                    component = %self.name,
                    error = %err,
                    "Circuit breaker reopened (recovery probe failed)"
                );
            }
            CircuitState::Closed => {
                if failures >= self.config.failure_threshold {
                    self.opened_at_epoch_nanos
                        .store(epoch_nanos_now(), Ordering::Release);
                    self.state
                        .store(CircuitState::Open as u8, Ordering::Release);
                    error!(
                        component = %self.name,
                        consecutive_failures = failures,
                        failure_threshold = self.config.failure_threshold,
                        reset_timeout_seconds = self.config.reset_timeout.as_secs(),
                        "Circuit breaker opened (failing fast)"
                    );
                } else {
                    warn!(
                        component = %self.name,
                        error = %err,
                        consecutive_failures = failures,
                        "Cache operation failed"
                    );
                }
            }
            CircuitState::Open => {}
        }
        drop(shared);

        self.backoff_delay(failures)
    }

    /// Jittered exponential backoff for the given consecutive-failure count
    fn backoff_delay(&self, failure_count: u32) -> Duration {
        let initial_ms = self.config.initial_backoff.as_millis() as f64;
        let max_ms = self.config.max_backoff.as_millis() as f64;

        let exponent = failure_count.max(1) - 1;
        let raw_ms = initial_ms * self.config.backoff_exponent.powi(exponent as i32);
        let capped_ms = raw_ms.min(max_ms);

        // 0-20% uniform jitter to de-synchronize retry storms
        let jittered_ms = capped_ms * (1.0 + fastrand::f64() * 0.2);
        Duration::from_millis(jittered_ms as u64)
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        let mut shared = self.shared.lock();
        shared.probe_in_flight = false;
        self.opened_at_epoch_nanos
            .store(epoch_nanos_now(), Ordering::Release);
        self.state.store(CircuitState::Open as u8, Ordering::Release);
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        let mut shared = self.shared.lock();
        shared.failure_count = 0;
        shared.probe_in_flight = false;
        self.opened_at_epoch_nanos.store(0, Ordering::Release);
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let consecutive = self.shared.lock().failure_count as u64;
        self.counters.snapshot(self.state(), consecutive)
    }
}
