//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typerace_protocol::RaceConfig;
use typerace_timer::CountdownConfig;

/// Deployment parameters shared by every room in a registry.
///
/// None of these change race semantics; they bound how long things may
/// take and how big rooms may get.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Pre-race countdown pacing.
    pub countdown: CountdownConfig,

    /// Maximum participants per room. `None` means unlimited.
    pub max_participants: Option<usize>,

    /// Safety deadline for words races, measured from race start. Stalled
    /// clients can't keep a room racing past this.
    pub words_race_ceiling: Duration,

    /// Safety deadline for time races, as a multiple of the race duration.
    pub time_race_deadline_factor: u32,

    /// How long a room may sit idle (finished and not restarted, or
    /// created and never joined) before it is torn down.
    pub idle_timeout: Duration,

    /// Capacity of each room's command channel.
    pub channel_size: usize,

    /// Configuration for rooms created without an explicit one.
    pub default_race: RaceConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            countdown: CountdownConfig::default(),
            max_participants: Some(8),
            words_race_ceiling: Duration::from_secs(10 * 60),
            time_race_deadline_factor: 2,
            idle_timeout: Duration::from_secs(5 * 60),
            channel_size: 64,
            default_race: RaceConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Clamp and fix any out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        self.countdown = self.countdown.validated();
        if self.time_race_deadline_factor < 1 {
            tracing::warn!(
                factor = self.time_race_deadline_factor,
                "time race deadline factor below 1: raising"
            );
            self.time_race_deadline_factor = 1;
        }
        if self.channel_size == 0 {
            tracing::warn!("room channel size of 0: using 1");
            self.channel_size = 1;
        }
        if self.max_participants == Some(0) {
            tracing::warn!("max participants of 0: treating as unlimited");
            self.max_participants = None;
        }
        if let Err(reason) = self.default_race.validate() {
            tracing::warn!(%reason, "default race config invalid: using built-in default");
            self.default_race = RaceConfig::default();
        }
        self
    }

    /// The safety deadline for a race under `race`, measured from race
    /// start.
    pub fn safety_deadline(&self, race: &RaceConfig) -> Duration {
        match *race {
            RaceConfig::Words { .. } => self.words_race_ceiling,
            RaceConfig::Time { duration_secs } => {
                Duration::from_secs(u64::from(duration_secs))
                    * self.time_race_deadline_factor.max(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.countdown.ticks, 3);
        assert_eq!(config.max_participants, Some(8));
        assert_eq!(config.time_race_deadline_factor, 2);
    }

    #[test]
    fn test_safety_deadline_time_mode_is_multiple_of_duration() {
        let config = CoordinatorConfig::default();
        let deadline =
            config.safety_deadline(&RaceConfig::Time { duration_secs: 60 });
        assert_eq!(deadline, Duration::from_secs(120));
    }

    #[test]
    fn test_safety_deadline_words_mode_is_fixed_ceiling() {
        let config = CoordinatorConfig {
            words_race_ceiling: Duration::from_secs(90),
            ..CoordinatorConfig::default()
        };
        let deadline =
            config.safety_deadline(&RaceConfig::Words { word_count: 500 });
        assert_eq!(deadline, Duration::from_secs(90));
    }

    #[test]
    fn test_validated_fixes_degenerate_values() {
        let config = CoordinatorConfig {
            time_race_deadline_factor: 0,
            channel_size: 0,
            max_participants: Some(0),
            default_race: RaceConfig::Words { word_count: 0 },
            ..CoordinatorConfig::default()
        }
        .validated();
        assert_eq!(config.time_race_deadline_factor, 1);
        assert_eq!(config.channel_size, 1);
        assert_eq!(config.max_participants, None);
        assert_eq!(config.default_race, RaceConfig::default());
    }
}
