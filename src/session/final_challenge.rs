//! Final group naming challenge
//!
//! Once three groups are solved the last one is not handed over for free: the player has to
//! name its theme. A semantic judge decides whether a guess captures the connection.

use super::Effect;
use crate::judge::{JudgeRequest, JudgeVerdict};
use crate::types::Category;
use serde::{Deserialize, Serialize};

/// Naming attempts before the round is lost
pub const MAX_ATTEMPTS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GuessVerdict {
    Correct { explanation: String },
    Incorrect { explanation: String, attempts_left: u8 },
    /// Terminal verdict; the explanation reveals the category name
    OutOfGuesses { explanation: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalChallenge {
    target: Category,
    attempts: u8,
    judging: bool,
    verdict: Option<GuessVerdict>,
}

impl FinalChallenge {
    pub fn new(target: Category) -> Self {
        Self {
            target,
            attempts: 0,
            judging: false,
            verdict: None,
        }
    }

    pub fn target(&self) -> &Category {
        &self.target
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    pub fn attempts_left(&self) -> u8 {
        MAX_ATTEMPTS.saturating_sub(self.attempts)
    }

    pub fn is_judging(&self) -> bool {
        self.judging
    }

    pub fn verdict(&self) -> Option<&GuessVerdict> {
        self.verdict.as_ref()
    }

    /// Outcome once the challenge is decided: `Some(true)` won, `Some(false)` lost
    pub fn outcome(&self) -> Option<bool> {
        match self.verdict {
            Some(GuessVerdict::Correct { .. }) => Some(true),
            Some(GuessVerdict::OutOfGuesses { .. }) => Some(false),
            _ => None,
        }
    }

    /// Start judging a guess. Returns the judge request, or `None` if the guess is ignored.
    pub fn begin_guess(&mut self, text: &str) -> Option<JudgeRequest> {
        let guess = text.trim();
        if guess.is_empty() || self.judging || self.outcome().is_some() {
            return None;
        }

        self.judging = true;
        self.verdict = None;
        Some(JudgeRequest {
            guess: guess.to_string(),
            category_name: self.target.name.clone(),
            words: self.target.words.clone(),
        })
    }

    /// Apply the judge's verdict for the guess in flight
    pub fn resolve(&mut self, verdict: JudgeVerdict) -> Option<Effect> {
        if !self.judging {
            return None;
        }
        self.judging = false;

        if verdict.is_match {
            self.verdict = Some(GuessVerdict::Correct {
                explanation: verdict.explanation,
            });
            return Some(Effect::ConcludeChallenge { won: true });
        }

        self.attempts += 1;
        if self.attempts >= MAX_ATTEMPTS {
            self.verdict = Some(GuessVerdict::OutOfGuesses {
                explanation: format!("The connection was: \"{}\"", self.target.name),
            });
            Some(Effect::ConcludeChallenge { won: false })
        } else {
            let explanation = if verdict.explanation.trim().is_empty() {
                "Not quite!".to_string()
            } else {
                verdict.explanation
            };
            self.verdict = Some(GuessVerdict::Incorrect {
                explanation,
                attempts_left: self.attempts_left(),
            });
            None
        }
    }
}
