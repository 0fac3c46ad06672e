//! Mode-specific race rules.
//!
//! Words races and time races measure progress and decide "done" in
//! structurally different ways (text completion vs. wall clock). All of
//! that numeric policy lives here, behind [`RaceRule`], so the room never
//! branches on the mode itself. A room picks its rule once, when the
//! countdown starts, and holds it for the whole race.

use std::time::Duration;

use tokio::time::Instant;
use typerace_protocol::{RaceConfig, RaceMode};

use crate::{RaceStats, RoomError};

/// Progress and finish rules for one race mode.
pub trait RaceRule: Send + Sync + std::fmt::Debug {
    /// Which mode this rule implements.
    fn mode(&self) -> RaceMode;

    /// Progress as a percentage in `0.0..=100.0`.
    fn calculate_progress(
        &self,
        typed_length: u32,
        total_length: u32,
        race_start: Instant,
        now: Instant,
    ) -> f64;

    /// Whether a participant with `stats` is done.
    fn is_finished(
        &self,
        stats: &RaceStats,
        config: &RaceConfig,
        race_start: Instant,
        now: Instant,
    ) -> bool;

    /// The instant at which this mode ends the race on its own, if any.
    fn natural_deadline(&self, _race_start: Instant) -> Option<Instant> {
        None
    }

    /// Elapsed time to use when computing WPM at `now`.
    fn scoring_elapsed(&self, race_start: Instant, now: Instant) -> Duration {
        now.saturating_duration_since(race_start)
    }
}

// ---------------------------------------------------------------------------
// WordsMode
// ---------------------------------------------------------------------------

/// Finish the text. Progress is the typed share of the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordsMode;

impl RaceRule for WordsMode {
    fn mode(&self) -> RaceMode {
        RaceMode::Words
    }

    fn calculate_progress(
        &self,
        typed_length: u32,
        total_length: u32,
        _race_start: Instant,
        _now: Instant,
    ) -> f64 {
        // An empty text has nothing to complete.
        if total_length == 0 {
            return 0.0;
        }
        let ratio = f64::from(typed_length) / f64::from(total_length);
        (100.0 * ratio).min(100.0)
    }

    fn is_finished(
        &self,
        stats: &RaceStats,
        _config: &RaceConfig,
        _race_start: Instant,
        _now: Instant,
    ) -> bool {
        stats.progress() >= 100.0
    }
}

// ---------------------------------------------------------------------------
// TimeMode
// ---------------------------------------------------------------------------

/// Type as much as possible before the clock runs out. Progress is the
/// elapsed share of the time limit; typed length plays no part.
#[derive(Debug, Clone, Copy)]
pub struct TimeMode {
    time_limit: Duration,
}

impl TimeMode {
    /// Creates a time rule. `time_limit_secs` must be positive.
    pub fn new(time_limit_secs: u32) -> Result<Self, RoomError> {
        if time_limit_secs == 0 {
            return Err(RoomError::UnsupportedMode(
                "time race with a zero time limit".into(),
            ));
        }
        Ok(Self {
            time_limit: Duration::from_secs(u64::from(time_limit_secs)),
        })
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
}

impl RaceRule for TimeMode {
    fn mode(&self) -> RaceMode {
        RaceMode::Time
    }

    fn calculate_progress(
        &self,
        _typed_length: u32,
        _total_length: u32,
        race_start: Instant,
        now: Instant,
    ) -> f64 {
        let elapsed = now.saturating_duration_since(race_start);
        let ratio = elapsed.as_secs_f64() / self.time_limit.as_secs_f64();
        (100.0 * ratio).min(100.0)
    }

    fn is_finished(
        &self,
        _stats: &RaceStats,
        _config: &RaceConfig,
        race_start: Instant,
        now: Instant,
    ) -> bool {
        now.saturating_duration_since(race_start) >= self.time_limit
    }

    fn natural_deadline(&self, race_start: Instant) -> Option<Instant> {
        Some(race_start + self.time_limit)
    }

    /// Capped at the limit: typing after the bell doesn't count.
    fn scoring_elapsed(&self, race_start: Instant, now: Instant) -> Duration {
        now.saturating_duration_since(race_start).min(self.time_limit)
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Picks the rule for `config`.
///
/// Configs are validated when a room is created or reconfigured, so an
/// error here means that validation was bypassed. Callers must surface it
/// loudly rather than fall back to some other mode.
pub fn strategy_for(config: &RaceConfig) -> Result<Box<dyn RaceRule>, RoomError> {
    match *config {
        RaceConfig::Words { word_count: 0 } => Err(RoomError::UnsupportedMode(
            "words race with zero words".into(),
        )),
        RaceConfig::Words { .. } => Ok(Box::new(WordsMode)),
        RaceConfig::Time { duration_secs } => {
            Ok(Box::new(TimeMode::new(duration_secs)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start: Instant, secs: u64) -> Instant {
        start + Duration::from_secs(secs)
    }

    #[test]
    fn test_words_progress_bounds() {
        let start = Instant::now();
        let rule = WordsMode;
        for total in [0u32, 1, 3, 17, 250] {
            for typed in [0u32, 1, 2, 3, 16, 17, 300] {
                let p = rule.calculate_progress(typed, total, start, start);
                assert!((0.0..=100.0).contains(&p), "typed={typed} total={total}");
                if total == 0 {
                    assert_eq!(p, 0.0);
                } else if typed >= total {
                    assert_eq!(p, 100.0);
                }
            }
        }
    }

    #[test]
    fn test_words_finished_only_at_full_progress() {
        let start = Instant::now();
        let config = RaceConfig::Words { word_count: 1 };
        let rule = WordsMode;
        let partial = RaceStats::default().update(10.0, 100.0, 99.9);
        let done = RaceStats::default().update(10.0, 100.0, 100.0);
        assert!(!rule.is_finished(&partial, &config, start, start));
        assert!(rule.is_finished(&done, &config, start, start));
        assert_eq!(rule.natural_deadline(start), None);
    }

    #[test]
    fn test_time_progress_and_finish() {
        let start = Instant::now();
        let config = RaceConfig::Time { duration_secs: 60 };
        let rule = TimeMode::new(60).unwrap();
        let idle = RaceStats::default();

        assert_eq!(rule.calculate_progress(0, 0, start, at(start, 30)), 50.0);
        assert!(!rule.is_finished(&idle, &config, start, at(start, 30)));
        assert!(!rule.is_finished(&idle, &config, start, at(start, 59)));
        assert!(rule.is_finished(&idle, &config, start, at(start, 60)));
        assert!(rule.is_finished(&idle, &config, start, at(start, 600)));
        assert_eq!(rule.calculate_progress(999, 10, start, at(start, 90)), 100.0);
    }

    #[test]
    fn test_time_scoring_elapsed_is_capped() {
        let start = Instant::now();
        let rule = TimeMode::new(30).unwrap();
        assert_eq!(
            rule.scoring_elapsed(start, at(start, 45)),
            Duration::from_secs(30)
        );
        assert_eq!(rule.natural_deadline(start), Some(at(start, 30)));
    }

    #[test]
    fn test_factory_selects_by_mode() {
        let words = strategy_for(&RaceConfig::Words { word_count: 10 }).unwrap();
        assert_eq!(words.mode(), RaceMode::Words);
        let time = strategy_for(&RaceConfig::Time { duration_secs: 15 }).unwrap();
        assert_eq!(time.mode(), RaceMode::Time);
    }

    #[test]
    fn test_factory_rejects_degenerate_configs() {
        assert!(matches!(
            strategy_for(&RaceConfig::Words { word_count: 0 }),
            Err(RoomError::UnsupportedMode(_))
        ));
        assert!(matches!(
            strategy_for(&RaceConfig::Time { duration_secs: 0 }),
            Err(RoomError::UnsupportedMode(_))
        ));
    }
}
