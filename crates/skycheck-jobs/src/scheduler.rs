//! Delay scheduler - single-shot, cancellable timers keyed by id.
//!
//! The scheduler knows nothing about jobs. Each armed key gets one tokio task
//! that sleeps for the delay and then runs the callback, unless the timer was
//! cancelled first. Armed keys are remembered for the scheduler's lifetime so
//! a key can never be armed twice.

use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::JobError;
use crate::record::JobId;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Per-key timer state. `state` decides the cancel/fire race: whichever side
/// moves it off `ARMED` first wins.
struct TimerSlot {
    state: Arc<AtomicU8>,
    token: CancellationToken,
}

impl TimerSlot {
    fn try_cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(ARMED, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if won {
            self.token.cancel();
        }
        won
    }

    fn is_armed(&self) -> bool {
        self.state.load(Ordering::SeqCst) == ARMED
    }
}

/// Generic single-shot timer service.
pub struct DelayScheduler<K = JobId> {
    timers: DashMap<K, TimerSlot>,
    root: CancellationToken,
}

impl<K> DelayScheduler<K>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
{
    /// Create a scheduler with no armed timers.
    pub fn new() -> Self {
        Self {
            timers: DashMap::new(),
            root: CancellationToken::new(),
        }
    }

    /// Run `callback(key)` once after `delay`.
    ///
    /// Returns immediately; the wait happens on a spawned task, so this must be
    /// called from within a tokio runtime. A key that was armed before (fired,
    /// pending or cancelled) is rejected with `AlreadyScheduled`.
    pub fn arm<F, Fut>(&self, key: K, delay: Duration, callback: F) -> Result<(), JobError>
    where
        F: FnOnce(K) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(ARMED));
        let token = self.root.child_token();

        match self.timers.entry(key.clone()) {
            Entry::Occupied(_) => return Err(JobError::AlreadyScheduled(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(TimerSlot {
                    state: state.clone(),
                    token: token.clone(),
                });
            }
        }

        debug!(key = %key, delay_ms = delay.as_millis() as u64, "timer armed");

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    // Covers the scheduler-wide shutdown path as well.
                    let _ = state.compare_exchange(ARMED, CANCELLED, Ordering::SeqCst, Ordering::SeqCst);
                    debug!(key = %key, "timer cancelled before firing");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            if state
                .compare_exchange(ARMED, FIRED, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                debug!(key = %key, "timer cancelled at expiry");
                return;
            }

            debug!(key = %key, "timer fired");
            callback(key).await;
        });

        Ok(())
    }

    /// Prevent a pending timer from firing.
    ///
    /// Returns `true` if this call stopped the timer; `false` if the key is
    /// unknown, already fired, or already cancelled.
    pub fn cancel(&self, key: &K) -> bool {
        let cancelled = self
            .timers
            .get(key)
            .map(|slot| slot.try_cancel())
            .unwrap_or(false);
        if cancelled {
            debug!(key = %key, "timer cancel requested");
        }
        cancelled
    }

    /// Whether `key` has a timer that has neither fired nor been cancelled.
    pub fn is_armed(&self, key: &K) -> bool {
        self.timers
            .get(key)
            .map(|slot| slot.is_armed())
            .unwrap_or(false)
    }

    /// Number of timers still waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.timers.iter().filter(|slot| slot.is_armed()).count()
    }

    /// Cancel every pending timer. Callbacks already running are unaffected.
    pub fn shutdown(&self) {
        let cancelled = self.timers.iter().filter(|slot| slot.try_cancel()).count();
        self.root.cancel();
        debug!(cancelled, "scheduler shut down");
    }
}

impl<K> Default for DelayScheduler<K>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
