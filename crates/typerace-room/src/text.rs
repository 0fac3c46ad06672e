//! Race text supply.

use rand::seq::IndexedRandom;
use typerace_protocol::RaceConfig;

/// Supplies the words for a race.
///
/// Called once per race, when the countdown starts. Implementations must
/// return quickly: the room's actor is waiting on the answer.
pub trait TextProvider: Send + Sync + 'static {
    /// Returns the race text as an ordered sequence of words.
    fn get_text(&self, config: &RaceConfig) -> Vec<String>;
}

/// Words generated per second of a time race. Covers 240 WPM so fast
/// typists don't run out of text.
pub const TIME_RACE_WORDS_PER_SECOND: u32 = 4;

const COMMON_WORDS: &[&str] = &[
    "the", "be", "of", "and", "a", "to", "in", "he", "have", "it", "that",
    "for", "they", "with", "as", "not", "on", "she", "at", "by", "this",
    "we", "you", "do", "but", "from", "or", "which", "one", "would", "all",
    "will", "there", "say", "who", "make", "when", "can", "more", "if",
    "no", "man", "out", "other", "so", "what", "time", "up", "go", "about",
    "than", "into", "could", "state", "only", "new", "year", "some", "take",
    "come", "these", "know", "see", "use", "get", "like", "then", "first",
    "any", "work", "now", "may", "such", "give", "over", "think", "most",
    "even", "find", "day", "also", "after", "way", "many", "must", "look",
    "before", "great", "back", "through", "long", "where", "much", "should",
    "well", "people", "down", "own", "just", "because", "good", "each",
];

/// A [`TextProvider`] drawing random words from a fixed list.
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    /// Creates a bank from `words`. Blank entries are dropped.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.trim().is_empty())
            .collect();
        Self { words }
    }

    /// A bank of common English words.
    pub fn english() -> Self {
        Self::new(COMMON_WORDS.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// How many words a race under `config` needs. Limits are clamped to
    /// the largest valid config so an unchecked config cannot ask for an
    /// unbounded text.
    pub fn words_needed(config: &RaceConfig) -> usize {
        match *config {
            RaceConfig::Words { word_count } => {
                word_count.min(RaceConfig::MAX_WORD_COUNT) as usize
            }
            RaceConfig::Time { duration_secs } => {
                let secs = duration_secs.min(RaceConfig::MAX_DURATION_SECS);
                (secs * TIME_RACE_WORDS_PER_SECOND) as usize
            }
        }
    }
}

impl Default for WordBank {
    fn default() -> Self {
        Self::english()
    }
}

impl TextProvider for WordBank {
    fn get_text(&self, config: &RaceConfig) -> Vec<String> {
        let mut rng = rand::rng();
        (0..Self::words_needed(config))
            .filter_map(|_| self.words.choose(&mut rng).cloned())
            .collect()
    }
}

/// The total character length of a race text: the words joined by single
/// spaces.
pub fn text_length(words: &[String]) -> u32 {
    let chars: usize = words.iter().map(|w| w.chars().count()).sum();
    let spaces = words.len().saturating_sub(1);
    u32::try_from(chars + spaces).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_race_gets_exact_count() {
        let bank = WordBank::english();
        let words = bank.get_text(&RaceConfig::Words { word_count: 12 });
        assert_eq!(words.len(), 12);
        assert!(words.iter().all(|w| COMMON_WORDS.contains(&w.as_str())));
    }

    #[test]
    fn test_time_race_gets_enough_words() {
        let bank = WordBank::english();
        let words = bank.get_text(&RaceConfig::Time { duration_secs: 30 });
        assert_eq!(words.len(), 120);
    }

    #[test]
    fn test_oversized_config_is_clamped() {
        let words = WordBank::words_needed(&RaceConfig::Words { word_count: u32::MAX });
        assert_eq!(words, RaceConfig::MAX_WORD_COUNT as usize);
        let words = WordBank::words_needed(&RaceConfig::Time { duration_secs: u32::MAX });
        assert_eq!(
            words,
            (RaceConfig::MAX_DURATION_SECS * TIME_RACE_WORDS_PER_SECOND) as usize
        );
    }

    #[test]
    fn test_empty_bank_yields_empty_text() {
        let bank = WordBank::new(["", "   "]);
        assert!(bank.is_empty());
        assert!(bank.get_text(&RaceConfig::Words { word_count: 5 }).is_empty());
    }

    #[test]
    fn test_text_length_counts_separating_spaces() {
        let words: Vec<String> = vec!["cat".into()];
        assert_eq!(text_length(&words), 3);
        let words: Vec<String> = vec!["the".into(), "cat".into(), "sat".into()];
        assert_eq!(text_length(&words), 11);
        assert_eq!(text_length(&[]), 0);
    }
}
