//! Search control: stop flag and time limits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Sentinel for "no limit" in the atomic soft-limit slot.
const NO_LIMIT: u64 = u64::MAX;

/// Controls when a search should stop.
///
/// The stop flag is shared with the protocol thread, which sets it on
/// `stop`, `quit`, and before starting a new search. The search itself reads
/// the flag at every node and checks the hard clock every 2048 nodes; the
/// soft limit is consulted only between iterations.
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    /// Soft limit in milliseconds, [`NO_LIMIT`] when absent. Atomic because
    /// the iterative-deepening loop extends it through `&self`.
    soft_limit_ms: AtomicU64,
    hard_limit: Option<Duration>,
}

impl SearchControl {
    /// Control for `go infinite` and depth-only searches: only the external
    /// stop flag ends the search.
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            soft_limit_ms: AtomicU64::new(NO_LIMIT),
            hard_limit: None,
        }
    }

    /// Control with soft and hard limits; the clock starts immediately.
    pub fn new_timed(stopped: Arc<AtomicBool>, soft: Duration, hard: Duration) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            soft_limit_ms: AtomicU64::new(soft.as_millis() as u64),
            hard_limit: Some(hard),
        }
    }

    /// Whether the search must abort right now.
    ///
    /// Returns `true` once the stop flag is set. The hard clock is only
    /// consulted every 2048 nodes; when it has expired, the stop flag is set
    /// so every later call is answered from the flag alone.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return true;
        }

        if nodes & 2047 != 0 {
            return false;
        }

        if let Some(hard) = self.hard_limit
            && self.elapsed() >= hard
        {
            self.stopped.store(true, Ordering::Release);
            return true;
        }

        false
    }

    /// Read the stop flag without touching the clock.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Set the stop flag.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether iterative deepening should refrain from starting another
    /// iteration: the stop flag is set or the soft limit has passed.
    pub fn should_stop_iterating(&self) -> bool {
        if self.is_stopped() {
            return true;
        }
        let soft_ms = self.soft_limit_ms.load(Ordering::Relaxed);
        soft_ms != NO_LIMIT && self.elapsed() >= Duration::from_millis(soft_ms)
    }

    /// Grow the soft limit by 30%.
    ///
    /// Used when the best move is still unstable at the soft deadline. The
    /// hard limit is unaffected and still bounds the search.
    pub fn extend_soft(&self) {
        let soft_ms = self.soft_limit_ms.load(Ordering::Relaxed);
        if soft_ms != NO_LIMIT {
            self.soft_limit_ms
                .store(soft_ms + soft_ms * 30 / 100, Ordering::Relaxed);
        }
    }

    /// The hard limit, if one is set.
    pub fn hard_limit(&self) -> Option<Duration> {
        self.hard_limit
    }

    /// Elapsed time since the search started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Reference to the shared stop flag.
    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stopped
    }
}
