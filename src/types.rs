use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Number of categories in a puzzle
pub const CATEGORY_COUNT: usize = 4;
/// Number of words in every category
pub const GROUP_SIZE: usize = 4;
/// Wrong submissions allowed before the round is lost
pub const MAX_MISTAKES: u8 = 4;

/// Index of a category inside its validated puzzle
pub type CategoryId = usize;
/// Monotonic round counter, also used to fence off stale async results
pub type Generation = u64;

/// A puzzle word, trimmed and uppercased on construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(String);

impl Word {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Word {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Difficulty label as supplied by the generator. Only 1..=4 carry a named tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(pub i64);

impl Difficulty {
    /// Stand-in for a value that is not an integer; sorts after every ranked group
    pub const UNRANKED: Difficulty = Difficulty(i64::MAX);

    pub fn tier(self) -> Tier {
        match self.0 {
            1 => Tier::Easy,
            2 => Tier::Medium,
            3 => Tier::Hard,
            4 => Tier::Tricky,
            _ => Tier::Unranked,
        }
    }
}

/// Presentation tier (label + color) selected by difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
    Tricky,
    /// Neutral tier for difficulty values outside 1..=4
    Unranked,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Easy => "Easy",
            Tier::Medium => "Medium",
            Tier::Hard => "Hard",
            Tier::Tricky => "Tricky",
            Tier::Unranked => "Unranked",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Tier::Easy => "#F9DF6D",
            Tier::Medium => "#A0C35A",
            Tier::Hard => "#B0C4EF",
            Tier::Tricky => "#BA81C5",
            Tier::Unranked => "#CCCCCC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub difficulty: Difficulty,
    pub words: [Word; GROUP_SIZE],
}

impl Category {
    pub fn contains(&self, word: &Word) -> bool {
        self.words.contains(word)
    }

    pub fn tier(&self) -> Tier {
        self.difficulty.tier()
    }
}

/// A validated puzzle. Immutable once built; only `puzzle::validate` constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Puzzle {
    pub(crate) categories: Vec<Category>,
}

impl Puzzle {
    /// Categories in presentation order (ascending difficulty)
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.categories.iter().flat_map(|c| c.words.iter())
    }
}

/// Fixed presentation delays. Defaults match the pacing of the web client.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    /// Debounce between the fourth selection and the automatic submit
    pub auto_submit: Duration,
    pub shake_clear: Duration,
    /// Delay before a lost round reveals the unsolved categories
    pub loss_reveal: Duration,
    pub challenge_win: Duration,
    pub challenge_loss: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            auto_submit: Duration::from_millis(350),
            shake_clear: Duration::from_millis(500),
            loss_reveal: Duration::from_millis(600),
            challenge_win: Duration::from_millis(1500),
            challenge_loss: Duration::from_millis(2500),
        }
    }
}

impl TimingConfig {
    /// Load timing overrides (milliseconds) from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let millis = |key: &str, fallback: Duration| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        Self {
            auto_submit: millis("AUTO_SUBMIT_MS", defaults.auto_submit),
            shake_clear: millis("SHAKE_CLEAR_MS", defaults.shake_clear),
            loss_reveal: millis("LOSS_REVEAL_MS", defaults.loss_reveal),
            challenge_win: millis("CHALLENGE_WIN_MS", defaults.challenge_win),
            challenge_loss: millis("CHALLENGE_LOSS_MS", defaults.challenge_loss),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_word_normalizes() {
        assert_eq!(Word::new("  apple "), Word::new("APPLE"));
        assert_eq!(Word::new("hot dog").as_str(), "HOT DOG");
        assert!(Word::new("   ").is_blank());
    }

    #[test]
    fn test_difficulty_tiers() {
        assert_eq!(Difficulty(1).tier(), Tier::Easy);
        assert_eq!(Difficulty(4).tier(), Tier::Tricky);
        assert_eq!(Difficulty(0).tier(), Tier::Unranked);
        assert_eq!(Difficulty(7).tier().color(), "#CCCCCC");
    }

    #[test]
    #[serial]
    fn test_timing_from_env() {
        std::env::set_var("SHAKE_CLEAR_MS", "20");
        std::env::set_var("LOSS_REVEAL_MS", "not a number");
        let timing = TimingConfig::from_env();
        std::env::remove_var("SHAKE_CLEAR_MS");
        std::env::remove_var("LOSS_REVEAL_MS");

        assert_eq!(timing.shake_clear, Duration::from_millis(20));
        assert_eq!(timing.loss_reveal, TimingConfig::default().loss_reveal);
    }
}
