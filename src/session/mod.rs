//! Puzzle state machine for a single round
//!
//! A [`GameSession`] owns the validated puzzle and everything the player does with it. The
//! phase is a tagged union, so state that only makes sense in one phase (the selection, the
//! naming challenge) only exists there.
//!
//! Operations never fail: a call whose precondition does not hold is a no-op. Anything that
//! has to happen later (auto-submit, clearing the shake, revealing groups after a loss) is
//! returned as an [`Effect`] for the caller to schedule and hand back through
//! [`GameSession::fire`].

mod final_challenge;

pub use final_challenge::{FinalChallenge, GuessVerdict, MAX_ATTEMPTS};

use crate::judge::{JudgeRequest, JudgeVerdict};
use crate::matcher::{self, MatchVerdict};
use crate::protocol::{PhaseView, SessionSnapshot, SolvedInfo, TierInfo};
use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// Delayed work requested by a session operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Submit the selection if it is still at this revision
    AutoSubmit { revision: u64 },
    /// Clear the shake feedback left by this mistake
    ClearShake { mistake: u8 },
    /// Append every unsolved category after a lost round
    RevealRemaining,
    /// Settle a decided naming challenge
    ConcludeChallenge { won: bool },
}

impl Effect {
    pub fn delay(&self, timing: &TimingConfig) -> Duration {
        match self {
            Effect::AutoSubmit { .. } => timing.auto_submit,
            Effect::ClearShake { .. } => timing.shake_clear,
            Effect::RevealRemaining => timing.loss_reveal,
            Effect::ConcludeChallenge { won: true } => timing.challenge_win,
            Effect::ConcludeChallenge { won: false } => timing.challenge_loss,
        }
    }
}

/// Ordered set of up to four selected words
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    words: Vec<Word>,
    revision: u64,
}

impl Selection {
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.words.len() == GROUP_SIZE
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.words.contains(word)
    }

    /// Bumped on every change; a pending auto-submit only fires for the revision it saw
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn insert(&mut self, word: Word) -> bool {
        if self.is_full() || self.contains(&word) {
            return false;
        }
        self.words.push(word);
        self.revision += 1;
        true
    }

    fn remove(&mut self, word: &Word) -> bool {
        let before = self.words.len();
        self.words.retain(|w| w != word);
        let removed = self.words.len() != before;
        if removed {
            self.revision += 1;
        }
        removed
    }

    fn take(&mut self) -> Vec<Word> {
        self.revision += 1;
        std::mem::take(&mut self.words)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Playing { selection: Selection, mistakes: u8 },
    FinalChallenge { challenge: FinalChallenge, mistakes: u8 },
    GameOver { won: bool, mistakes: u8 },
}

impl Phase {
    pub fn mistakes(&self) -> u8 {
        match self {
            Phase::Playing { mistakes, .. }
            | Phase::FinalChallenge { mistakes, .. }
            | Phase::GameOver { mistakes, .. } => *mistakes,
        }
    }
}

/// Result of a submission that actually ran
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport {
    pub verdict: MatchVerdict,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    id: String,
    round: Generation,
    puzzle: Puzzle,
    board: Vec<Word>,
    solved: Vec<CategoryId>,
    phase: Phase,
    shake: Vec<Word>,
    last_verdict: Option<MatchVerdict>,
}

impl GameSession {
    pub fn new<R: Rng + ?Sized>(puzzle: Puzzle, round: Generation, rng: &mut R) -> Self {
        let mut board: Vec<Word> = puzzle.words().cloned().collect();
        board.shuffle(rng);

        Self {
            id: ulid::Ulid::new().to_string(),
            round,
            puzzle,
            board,
            solved: Vec::new(),
            phase: Phase::Playing {
                selection: Selection::default(),
                mistakes: 0,
            },
            shake: Vec::new(),
            last_verdict: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn round(&self) -> Generation {
        self.round
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn mistakes(&self) -> u8 {
        self.phase.mistakes()
    }

    /// Solved categories in solve order
    pub fn solved(&self) -> Vec<&Category> {
        self.solved
            .iter()
            .filter_map(|id| self.puzzle.category(*id))
            .collect()
    }

    pub fn selection(&self) -> &[Word] {
        match &self.phase {
            Phase::Playing { selection, .. } => selection.words(),
            _ => &[],
        }
    }

    pub fn challenge(&self) -> Option<&FinalChallenge> {
        match &self.phase {
            Phase::FinalChallenge { challenge, .. } => Some(challenge),
            _ => None,
        }
    }

    /// `Some(won)` once the round is over
    pub fn outcome(&self) -> Option<bool> {
        match self.phase {
            Phase::GameOver { won, .. } => Some(won),
            _ => None,
        }
    }

    pub fn is_solved(&self, word: &Word) -> bool {
        self.solved
            .iter()
            .filter_map(|id| self.puzzle.category(*id))
            .any(|c| c.contains(word))
    }

    /// Unsolved words in display order
    pub fn board(&self) -> Vec<&Word> {
        self.board.iter().filter(|w| !self.is_solved(w)).collect()
    }

    fn unsolved_ids(&self) -> Vec<CategoryId> {
        self.puzzle
            .categories()
            .iter()
            .map(|c| c.id)
            .filter(|id| !self.solved.contains(id))
            .collect()
    }

    pub fn select(&mut self, word: &Word) -> Vec<Effect> {
        let on_board = self.puzzle.words().any(|w| w == word);
        if !on_board || self.is_solved(word) {
            return Vec::new();
        }
        let Phase::Playing { selection, .. } = &mut self.phase else {
            return Vec::new();
        };
        if !selection.insert(word.clone()) {
            return Vec::new();
        }

        self.last_verdict = None;
        if selection.is_full() {
            vec![Effect::AutoSubmit {
                revision: selection.revision(),
            }]
        } else {
            Vec::new()
        }
    }

    pub fn deselect(&mut self, word: &Word) {
        if let Phase::Playing { selection, .. } = &mut self.phase {
            if selection.remove(word) {
                self.last_verdict = None;
            }
        }
    }

    /// Tile tap: select the word, or deselect it if it is already selected
    pub fn toggle(&mut self, word: &Word) -> Vec<Effect> {
        if self.selection().contains(word) {
            self.deselect(word);
            Vec::new()
        } else {
            self.select(word)
        }
    }

    pub fn deselect_all(&mut self) {
        if let Phase::Playing { selection, .. } = &mut self.phase {
            if !selection.is_empty() {
                selection.take();
            }
            self.last_verdict = None;
        }
    }

    /// Reorder the board. Solved state and the selection are untouched.
    pub fn shuffle_display<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.board.shuffle(rng);
    }

    pub fn submit(&mut self) -> Option<SubmitReport> {
        let Phase::Playing {
            selection,
            mistakes,
        } = &mut self.phase
        else {
            return None;
        };
        if !selection.is_full() {
            return None;
        }

        let solved = &self.solved;
        let unsolved = self
            .puzzle
            .categories()
            .iter()
            .filter(|c| !solved.contains(&c.id));
        let verdict = matcher::evaluate(unsolved, selection.words());
        let submitted = selection.take();
        let mistakes_so_far = *mistakes;
        self.last_verdict = Some(verdict);

        let mut effects = Vec::new();
        match verdict {
            MatchVerdict::Exact(id) => {
                self.solved.push(id);
                let remaining = self.unsolved_ids();
                tracing::debug!(
                    "Round {}: solved category {} ({} remaining)",
                    self.round,
                    id,
                    remaining.len()
                );

                match remaining.as_slice() {
                    [last] => {
                        if let Some(target) = self.puzzle.category(*last).cloned() {
                            tracing::info!(
                                "Round {}: entering final challenge for '{}'",
                                self.round,
                                target.name
                            );
                            self.phase = Phase::FinalChallenge {
                                challenge: FinalChallenge::new(target),
                                mistakes: mistakes_so_far,
                            };
                        }
                    }
                    [] => {
                        self.phase = Phase::GameOver {
                            won: true,
                            mistakes: mistakes_so_far,
                        };
                    }
                    _ => {}
                }
            }
            MatchVerdict::Close | MatchVerdict::Miss => {
                let mistake = mistakes_so_far + 1;
                self.shake = submitted;
                effects.push(Effect::ClearShake { mistake });

                if mistake >= MAX_MISTAKES {
                    tracing::info!("Round {}: out of mistakes", self.round);
                    self.phase = Phase::GameOver {
                        won: false,
                        mistakes: mistake,
                    };
                    effects.push(Effect::RevealRemaining);
                } else if let Phase::Playing { mistakes, .. } = &mut self.phase {
                    *mistakes = mistake;
                }
            }
        }

        Some(SubmitReport { verdict, effects })
    }

    /// Start judging a naming guess. `None` means the guess was ignored.
    pub fn begin_guess(&mut self, text: &str) -> Option<JudgeRequest> {
        match &mut self.phase {
            Phase::FinalChallenge { challenge, .. } => challenge.begin_guess(text),
            _ => None,
        }
    }

    pub fn resolve_guess(&mut self, verdict: JudgeVerdict) -> Vec<Effect> {
        match &mut self.phase {
            Phase::FinalChallenge { challenge, .. } => {
                challenge.resolve(verdict).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Apply a previously scheduled effect if it still applies
    pub fn fire(&mut self, effect: Effect) -> Vec<Effect> {
        match effect {
            Effect::AutoSubmit { revision } => {
                let current = matches!(
                    &self.phase,
                    Phase::Playing { selection, .. } if selection.revision() == revision
                );
                if !current {
                    return Vec::new();
                }
                self.submit()
                    .map(|report| report.effects)
                    .unwrap_or_default()
            }
            Effect::ClearShake { mistake } => {
                if self.mistakes() == mistake {
                    self.shake.clear();
                }
                Vec::new()
            }
            Effect::RevealRemaining => {
                if let Phase::GameOver { won: false, .. } = self.phase {
                    let remaining = self.unsolved_ids();
                    self.solved.extend(remaining);
                }
                Vec::new()
            }
            Effect::ConcludeChallenge { won } => {
                let settled = match &self.phase {
                    Phase::FinalChallenge {
                        challenge,
                        mistakes,
                    } if challenge.outcome() == Some(won) => {
                        Some((challenge.target().id, *mistakes))
                    }
                    _ => None,
                };
                if let Some((target, mistakes)) = settled {
                    if !self.solved.contains(&target) {
                        self.solved.push(target);
                    }
                    tracing::info!(
                        "Round {}: final challenge {}",
                        self.round,
                        if won { "won" } else { "lost" }
                    );
                    self.phase = Phase::GameOver { won, mistakes };
                }
                Vec::new()
            }
        }
    }

    /// Read-only view for the presentation layer
    pub fn snapshot(&self) -> SessionSnapshot {
        let phase = match &self.phase {
            Phase::Playing { .. } => PhaseView::Playing,
            Phase::FinalChallenge { challenge, .. } => PhaseView::FinalChallenge {
                words: challenge.target().words.to_vec(),
                attempts_left: challenge.attempts_left(),
                judging: challenge.is_judging(),
                verdict: challenge.verdict().cloned(),
            },
            Phase::GameOver { won, .. } => PhaseView::GameOver { won: *won },
        };

        SessionSnapshot {
            session_id: self.id.clone(),
            round: self.round,
            tiers: self
                .puzzle
                .categories()
                .iter()
                .map(|c| TierInfo::from(c.tier()))
                .collect(),
            board: self.board().into_iter().cloned().collect(),
            solved: self.solved().into_iter().map(SolvedInfo::from).collect(),
            selection: self.selection().to_vec(),
            shake: self.shake.clone(),
            one_away: matches!(self.phase, Phase::Playing { .. })
                && self.last_verdict == Some(MatchVerdict::Close),
            last_verdict: self.last_verdict,
            mistakes_remaining: MAX_MISTAKES.saturating_sub(self.mistakes()),
            phase,
        }
    }
}
