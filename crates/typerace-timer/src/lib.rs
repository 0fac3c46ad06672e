//! Deadline timers for Typerace room actors.
//!
//! A room only ever waits on a handful of things: the next countdown tick,
//! the end of a timed race, the safety deadline that guarantees a race
//! terminates, and the idle expiry of a finished room. [`Timers`] keeps
//! those as a small keyed set of deadlines and resolves whichever is due
//! first.
//!
//! # Integration
//!
//! The set is designed to sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = cmd_rx.recv() => { /* handle commands, arm/cancel timers */ }
//!         fired = timers.fired() => { /* react to fired.key */ }
//!     }
//! }
//! ```
//!
//! With nothing armed, [`Timers::fired`] pends forever, so `select!` just
//! keeps serving commands. Dropping the set (e.g. when the actor stops)
//! cancels everything with it; there is no background task to leak.

use std::fmt::Debug;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Countdown configuration
// ---------------------------------------------------------------------------

/// How the pre-race countdown is paced.
///
/// The countdown is `ticks` steps of `interval` each. Zero ticks means the
/// race clock starts as soon as the host starts the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Number of countdown steps announced to clients.
    pub ticks: u32,
    /// Time between steps.
    pub interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            ticks: 3,
            interval: Duration::from_secs(1),
        }
    }
}

impl CountdownConfig {
    /// Longest countdown we allow, in ticks.
    pub const MAX_TICKS: u32 = 10;

    /// Shortest tick interval we allow when ticks > 0.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    /// Creates a config with `ticks` steps of `interval`.
    pub fn new(ticks: u32, interval: Duration) -> Self {
        Self { ticks, interval }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// - `ticks` capped to [`Self::MAX_TICKS`].
    /// - `interval` raised to [`Self::MIN_INTERVAL`] when there are ticks.
    pub fn validated(mut self) -> Self {
        if self.ticks > Self::MAX_TICKS {
            warn!(
                ticks = self.ticks,
                max = Self::MAX_TICKS,
                "countdown ticks exceed maximum: clamping"
            );
            self.ticks = Self::MAX_TICKS;
        }
        if self.ticks > 0 && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "countdown interval below minimum: raising"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }

    /// Total countdown length.
    pub fn total(&self) -> Duration {
        self.interval * self.ticks
    }
}

// ---------------------------------------------------------------------------
// Fired
// ---------------------------------------------------------------------------

/// A deadline that has come due, returned by [`Timers::fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<K> {
    /// Which timer fired.
    pub key: K,
    /// When it was scheduled to fire.
    pub deadline: Instant,
    /// How late the actor observed it. Normally near zero; grows when the
    /// actor was busy.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// A small set of one-shot deadlines, at most one per key.
///
/// Keys are usually a fieldless enum naming what the deadline is for.
/// Re-arming a key replaces its deadline.
#[derive(Debug)]
pub struct Timers<K> {
    entries: Vec<(K, Instant)>,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Copy + Eq + Debug> Timers<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire at `deadline`, replacing any previous deadline
    /// for that key.
    pub fn arm_at(&mut self, key: K, deadline: Instant) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = deadline,
            None => self.entries.push((key, deadline)),
        }
        debug!(
            ?key,
            in_ms = deadline
                .saturating_duration_since(Instant::now())
                .as_millis() as u64,
            "timer armed"
        );
    }

    /// Arms `key` to fire `after` from now.
    pub fn arm_in(&mut self, key: K, after: Duration) {
        self.arm_at(key, Instant::now() + after);
    }

    /// Disarms `key`. Returns `true` if it was armed.
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != key);
        let removed = self.entries.len() != before;
        if removed {
            debug!(?key, "timer cancelled");
        }
        removed
    }

    /// Disarms everything. Returns how many timers were armed.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// The deadline of `key`, if armed.
    pub fn deadline(&self, key: K) -> Option<Instant> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, at)| *at)
    }

    /// Whether `key` is armed.
    pub fn is_armed(&self, key: K) -> bool {
        self.deadline(key).is_some()
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is armed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The earliest armed deadline. Ties go to the key armed first.
    fn earliest(&self) -> Option<(K, Instant)> {
        self.entries
            .iter()
            .copied()
            .reduce(|best, next| if next.1 < best.1 { next } else { best })
    }

    /// Waits for the earliest armed deadline, disarms it and returns it.
    ///
    /// With nothing armed this future pends forever. It is cancel-safe:
    /// if dropped before completing (another `select!` branch won), no
    /// timer is consumed.
    pub async fn fired(&mut self) -> Fired<K> {
        let Some((key, deadline)) = self.earliest() else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        self.entries.retain(|(k, _)| *k != key);
        let late_by = Instant::now().saturating_duration_since(deadline);
        trace!(
            ?key,
            late_ms = late_by.as_secs_f64() * 1000.0,
            "timer fired"
        );

        Fired {
            key,
            deadline,
            late_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_default_is_three_seconds() {
        let cfg = CountdownConfig::default();
        assert_eq!(cfg.ticks, 3);
        assert_eq!(cfg.total(), Duration::from_secs(3));
    }

    #[test]
    fn test_countdown_validated_clamps_ticks() {
        let cfg = CountdownConfig::new(50, Duration::from_secs(1)).validated();
        assert_eq!(cfg.ticks, CountdownConfig::MAX_TICKS);
    }

    #[test]
    fn test_countdown_validated_raises_interval() {
        let cfg = CountdownConfig::new(3, Duration::ZERO).validated();
        assert_eq!(cfg.interval, CountdownConfig::MIN_INTERVAL);
    }

    #[test]
    fn test_countdown_zero_ticks_keeps_interval() {
        let cfg = CountdownConfig::new(0, Duration::ZERO).validated();
        assert_eq!(cfg.ticks, 0);
        assert_eq!(cfg.total(), Duration::ZERO);
    }
}
