//! Per-participant race statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Characters that count as one "word" for WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

/// An immutable snapshot of one participant's numbers.
///
/// Nothing mutates a `RaceStats` in place: [`RaceStats::update`] hands back
/// a fresh value and the room swaps it in, so a snapshot taken for a
/// broadcast never changes under the reader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceStats {
    wpm: f64,
    accuracy: f64,
    progress: f64,
}

impl Default for RaceStats {
    fn default() -> Self {
        Self {
            wpm: 0.0,
            accuracy: 100.0,
            progress: 0.0,
        }
    }
}

impl RaceStats {
    /// Returns a new value with the given numbers, clamped to their
    /// ranges (wpm ≥ 0, accuracy and progress in 0..=100). NaN becomes 0.
    #[must_use]
    pub fn update(&self, wpm: f64, accuracy: f64, progress: f64) -> Self {
        Self {
            wpm: non_negative(wpm),
            accuracy: percentage(accuracy),
            progress: percentage(progress),
        }
    }

    pub fn wpm(&self) -> f64 {
        self.wpm
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.max(0.0) }
}

fn percentage(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}

/// Gross words per minute: `(chars / 5) / minutes`. Zero when no time has
/// elapsed.
pub fn gross_wpm(chars: u32, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return 0.0;
    }
    (f64::from(chars) / CHARS_PER_WORD) / (seconds / 60.0)
}

/// Accuracy as a whole percentage: `round(100 * correct / typed)`, 100 when
/// nothing has been typed. Capped at 100 if a client reports more correct
/// characters than typed ones.
pub fn accuracy(correct_chars: u32, typed_chars: u32) -> f64 {
    if typed_chars == 0 {
        return 100.0;
    }
    let ratio = f64::from(correct_chars) / f64::from(typed_chars);
    (100.0 * ratio).round().min(100.0)
}
