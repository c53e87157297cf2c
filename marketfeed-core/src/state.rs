//! Per-adapter shared mutable state: rolling counters and the cooldown
//! deadline.
//!
//! Plain `std::sync::atomic` counters plus a `Mutex<Option<Instant>>` for the
//! cooldown deadline keep the concurrent-access race closed without a
//! heavier synchronization primitive.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// The counters and cooldown deadline an adapter instance exclusively owns.
///
/// Exposed only through read/set methods; no field is public, so callers
/// cannot observe or mutate this state except through the sanctioned
/// operations (`is_in_cooldown`, `set_cooldown`, `record_request`,
/// `record_error`, `success_rate`).
#[derive(Debug)]
pub struct AdapterState {
    initialized: AtomicBool,
    request_count: AtomicU64,
    error_count: AtomicU64,
    cooldown_until: Mutex<Option<Instant>>,
}

impl AdapterState {
    /// A fresh, uninitialized state with no requests recorded and no
    /// cooldown in effect.
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            cooldown_until: Mutex::new(None),
        }
    }

    /// Mark the adapter initialized.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// Clear the initialized flag, e.g. on shutdown.
    pub fn clear_initialized(&self) {
        self.initialized.store(false, Ordering::Release);
    }

    /// Whether the adapter has been initialized and not yet shut down.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Record that a call was attempted.
    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that an attempted call failed.
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Total calls attempted since construction.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Total calls that failed since construction.
    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// `1.0 - error_count / request_count`, or `1.0` with no requests yet.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let requests = self.request_count();
        if requests == 0 {
            return 1.0;
        }
        1.0 - (self.error_count() as f64 / requests as f64)
    }

    /// Whether `cooldown_until` is still in the future.
    #[must_use]
    pub fn is_in_cooldown(&self) -> bool {
        match *self.cooldown_until.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(deadline) => Instant::now() < deadline,
            None => false,
        }
    }

    /// Set the cooldown deadline to `now + seconds`.
    ///
    /// Cooldown is not monotonic: a second `set_cooldown` call overwrites the
    /// deadline unconditionally, even if it is earlier than a still-running
    /// prior one, so the last observed rate-limit error always wins.
    pub fn set_cooldown(&self, seconds: u64) {
        let deadline = Instant::now() + Duration::from_secs(seconds);
        *self.cooldown_until.lock().unwrap_or_else(|e| e.into_inner()) = Some(deadline);
    }

    /// The remaining cooldown duration, if still in cooldown.
    #[must_use]
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        let deadline = (*self.cooldown_until.lock().unwrap_or_else(|e| e.into_inner()))?;
        let now = Instant::now();
        if now < deadline {
            Some(deadline - now)
        } else {
            None
        }
    }
}

impl Default for AdapterState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_state_is_not_in_cooldown() {
        let state = AdapterState::new();
        assert!(!state.is_in_cooldown());
    }

    #[test]
    fn set_cooldown_takes_effect_immediately() {
        let state = AdapterState::new();
        state.set_cooldown(60);
        assert!(state.is_in_cooldown());
        assert!(state.cooldown_remaining().is_some());
    }

    #[test]
    fn success_rate_is_one_with_no_requests() {
        let state = AdapterState::new();
        assert_eq!(state.success_rate(), 1.0);
    }

    #[test]
    fn success_rate_reflects_recorded_errors() {
        let state = AdapterState::new();
        for _ in 0..4 {
            state.record_request();
        }
        state.record_error();
        assert!((state.success_rate() - 0.75).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn success_rate_stays_in_unit_interval(requests in 0u64..10_000, errors in 0u64..10_000) {
            let state = AdapterState::new();
            for _ in 0..requests {
                state.record_request();
            }
            for _ in 0..errors.min(requests) {
                state.record_error();
            }
            let rate = state.success_rate();
            prop_assert!((0.0..=1.0).contains(&rate));
        }
    }
}
