//! Exact sliding-window request counter.
//!
//! Each identity keeps the instants of its admitted requests. Every check first
//! drops the instants that fell out of the trailing window, so the retained
//! sequence only ever covers `[now - window, now]`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;

/// Admitted request instants for one identity, oldest first.
#[derive(Debug, Default)]
struct RateWindow {
    instants: VecDeque<Instant>,
}

impl RateWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        let Some(cutoff) = now.checked_sub(window) else {
            return;
        };
        while let Some(front) = self.instants.front() {
            if *front < cutoff {
                self.instants.pop_front();
            } else {
                break;
            }
        }
    }

    /// Count of retained instants that are still inside the window at `now`.
    fn live_count(&self, now: Instant, window: Duration) -> usize {
        match now.checked_sub(window) {
            Some(cutoff) => self.instants.iter().filter(|i| **i >= cutoff).count(),
            None => self.instants.len(),
        }
    }
}

/// Sliding-window limiter over arbitrary identities.
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the windows mutex, recovering from poison if necessary.
    fn lock_windows(&self) -> MutexGuard<'_, HashMap<String, RateWindow>> {
        self.windows.lock().unwrap_or_else(|poisoned| {
            warn!("Sliding window mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record a request for `identity` if it is under `max` for the window.
    ///
    /// A rejected request is not recorded.
    pub fn consume(&self, identity: &str, max: u32, window: Duration) -> bool {
        self.consume_at(identity, max, window, Instant::now())
    }

    pub(crate) fn consume_at(
        &self,
        identity: &str,
        max: u32,
        window: Duration,
        now: Instant,
    ) -> bool {
        let mut windows = self.lock_windows();
        let entry = windows.entry(identity.to_string()).or_default();
        entry.prune(now, window);

        if entry.instants.len() >= max as usize {
            return false;
        }
        entry.instants.push_back(now);
        true
    }

    /// Requests left for `identity` in the window. Does not record anything.
    pub fn remaining(&self, identity: &str, max: u32, window: Duration) -> u32 {
        self.remaining_at(identity, max, window, Instant::now())
    }

    pub(crate) fn remaining_at(
        &self,
        identity: &str,
        max: u32,
        window: Duration,
        now: Instant,
    ) -> u32 {
        let windows = self.lock_windows();
        let used = windows
            .get(identity)
            .map(|w| w.live_count(now, window))
            .unwrap_or(0);
        max.saturating_sub(used.min(u32::MAX as usize) as u32)
    }

    /// Number of identities with a window, including ones that went idle.
    pub fn tracked_identities(&self) -> usize {
        self.lock_windows().len()
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}
