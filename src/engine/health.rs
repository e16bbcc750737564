//! Per-service circuit breaker with exponential backoff.
//!
//! Guards every upstream generation call. After N consecutive failures a
//! service is marked unavailable for a backoff window that doubles with each
//! further failure, capped at five minutes. Recovery is lazy: availability is
//! re-evaluated on query (half-open probe), never polled.
//!
//! The tracker is an explicitly constructed value with process lifetime,
//! passed into the orchestrator as a dependency. One instance is shared
//! across every conversation; all methods are safe under concurrent use.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::ProviderError;

// =============================================================================
// Configuration
// =============================================================================

/// Circuit breaker tuning. Defaults: 3 failures open the circuit, 30s base
/// backoff doubling per failure, capped at 5 minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub failure_threshold: u32,
    pub base_backoff_secs: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            base_backoff_secs: 30,
            backoff_multiplier: 2.0,
            max_backoff_secs: 300,
        }
    }
}

// =============================================================================
// Service status
// =============================================================================

/// Operator-facing snapshot of one upstream service.
///
/// Invariant: `next_retry_time` is Some if and only if `is_available` is
/// false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub is_available: bool,
    pub consecutive_failures: u32,
    pub last_failure: Option<DateTime<Utc>>,
    pub next_retry_time: Option<DateTime<Utc>>,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self {
            is_available: true,
            consecutive_failures: 0,
            last_failure: None,
            next_retry_time: None,
        }
    }
}

// =============================================================================
// Guarded call errors
// =============================================================================

/// Failure modes of a health-guarded call. Returned by value; nothing here
/// unwinds.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The circuit is open; the operation was not attempted.
    #[error("service '{service}' unavailable, retry in {retry_after_secs}s")]
    Open {
        service: String,
        retry_after_secs: u64,
    },
    /// The operation ran and failed. Carries the status snapshot taken right
    /// after the failure was recorded.
    #[error("service '{service}' call failed: {source}")]
    Failed {
        service: String,
        status: ServiceStatus,
        #[source]
        source: ProviderError,
    },
}

// =============================================================================
// Tracker
// =============================================================================

/// Concurrency-safe name → status store with circuit breaker semantics.
pub struct ServiceHealthTracker {
    config: HealthConfig,
    states: Mutex<HashMap<String, ServiceStatus>>,
}

impl ServiceHealthTracker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Record a successful call. Unconditionally resets the entry; calling it
    /// twice in a row yields the same state as once.
    pub fn record_success(&self, service: &str) {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(service.to_string()).or_default();
        if !state.is_available || state.consecutive_failures > 0 {
            tracing::info!(service = %service, "Service recovered, resetting failure count");
        }
        *state = ServiceStatus::default();
    }

    /// Record a failed call at the current time.
    pub fn record_failure(&self, service: &str) {
        self.record_failure_at(service, Utc::now());
    }

    /// Clock-explicit variant of [`record_failure`](Self::record_failure).
    pub fn record_failure_at(&self, service: &str, now: DateTime<Utc>) {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(service.to_string()).or_default();
        state.consecutive_failures += 1;
        state.last_failure = Some(now);

        if state.consecutive_failures >= self.config.failure_threshold {
            let backoff = self.backoff_for(state.consecutive_failures);
            state.is_available = false;
            state.next_retry_time = Some(
                now + chrono::Duration::from_std(backoff)
                    .unwrap_or_else(|_| chrono::Duration::zero()),
            );
            tracing::warn!(
                service = %service,
                failures = state.consecutive_failures,
                backoff_secs = backoff.as_secs(),
                "Circuit opened after consecutive failures",
            );
        } else {
            tracing::debug!(
                service = %service,
                failures = state.consecutive_failures,
                "Failure recorded, circuit still closed",
            );
        }
    }

    /// Check availability at the current time.
    pub fn is_available(&self, service: &str) -> bool {
        self.is_available_at(service, Utc::now())
    }

    /// Clock-explicit variant of [`is_available`](Self::is_available).
    ///
    /// When an unavailable service's backoff window has elapsed the entry is
    /// flipped back to available under the lock (half-open probe), preserving
    /// the failure count for bookkeeping. Availability must therefore be
    /// queried, not cached.
    pub fn is_available_at(&self, service: &str, now: DateTime<Utc>) -> bool {
        let mut states = self.states.lock().unwrap();
        let state = match states.get_mut(service) {
            None => return true,
            Some(s) => s,
        };
        if state.is_available {
            return true;
        }
        match state.next_retry_time {
            Some(retry_at) if now >= retry_at => {
                tracing::info!(
                    service = %service,
                    failures = state.consecutive_failures,
                    "Circuit half-open: allowing probe after backoff",
                );
                state.is_available = true;
                state.next_retry_time = None;
                true
            }
            _ => false,
        }
    }

    /// Seconds until the service's backoff window elapses. Zero when the
    /// service is available.
    pub fn retry_after_secs(&self, service: &str, now: DateTime<Utc>) -> u64 {
        let states = self.states.lock().unwrap();
        states
            .get(service)
            .and_then(|s| s.next_retry_time)
            .map(|t| (t - now).num_seconds().max(0) as u64)
            .unwrap_or(0)
    }

    /// Operator override: force the entry back to available regardless of
    /// history.
    pub fn reset_service(&self, service: &str) {
        let mut states = self.states.lock().unwrap();
        states.insert(service.to_string(), ServiceStatus::default());
        tracing::info!(service = %service, "Service manually reset");
    }

    /// Snapshot of one service's status. Default (healthy) when never seen.
    pub fn status(&self, service: &str) -> ServiceStatus {
        let states = self.states.lock().unwrap();
        states.get(service).cloned().unwrap_or_default()
    }

    /// Snapshot of every tracked service.
    pub fn all_statuses(&self) -> HashMap<String, ServiceStatus> {
        self.states.lock().unwrap().clone()
    }

    /// Run `op` under circuit breaker protection.
    ///
    /// Returns [`GuardError::Open`] without running `op` when the circuit is
    /// open. Otherwise records success/failure against the service and, on
    /// failure, returns the original error annotated with the service name
    /// and a post-failure status snapshot.
    pub async fn wrap<T, F, Fut>(&self, service: &str, op: F) -> Result<T, GuardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let now = Utc::now();
        if !self.is_available_at(service, now) {
            return Err(GuardError::Open {
                service: service.to_string(),
                retry_after_secs: self.retry_after_secs(service, now),
            });
        }
        match op().await {
            Ok(value) => {
                self.record_success(service);
                Ok(value)
            }
            Err(source) => {
                self.record_failure(service);
                Err(GuardError::Failed {
                    service: service.to_string(),
                    status: self.status(service),
                    source,
                })
            }
        }
    }

    /// Backoff duration once `failures` has crossed the threshold.
    fn backoff_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(self.config.failure_threshold);
        let secs = self.config.base_backoff_secs as f64
            * self.config.backoff_multiplier.powi(exponent as i32);
        Duration::from_secs_f64(secs.min(self.config.max_backoff_secs as f64))
    }
}

impl Default for ServiceHealthTracker {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}
