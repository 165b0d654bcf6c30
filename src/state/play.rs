use super::{AppState, NoActiveRound};
use crate::matcher::MatchVerdict;
use crate::types::Word;

impl AppState {
    pub async fn select(&self, word: &str) -> Result<(), NoActiveRound> {
        let word = Word::new(word);
        self.with_session(|session| ((), session.select(&word))).await
    }

    pub async fn deselect(&self, word: &str) -> Result<(), NoActiveRound> {
        let word = Word::new(word);
        self.with_session(|session| {
            session.deselect(&word);
            ((), Vec::new())
        })
        .await
    }

    pub async fn toggle(&self, word: &str) -> Result<(), NoActiveRound> {
        let word = Word::new(word);
        self.with_session(|session| ((), session.toggle(&word))).await
    }

    pub async fn deselect_all(&self) -> Result<(), NoActiveRound> {
        self.with_session(|session| {
            session.deselect_all();
            ((), Vec::new())
        })
        .await
    }

    pub async fn shuffle(&self) -> Result<(), NoActiveRound> {
        self.with_session(|session| {
            session.shuffle_display(&mut rand::rng());
            ((), Vec::new())
        })
        .await
    }

    /// Submit the current selection. `Ok(None)` means the submission did not run.
    pub async fn submit(&self) -> Result<Option<MatchVerdict>, NoActiveRound> {
        self.with_session(|session| match session.submit() {
            Some(report) => {
                tracing::debug!("Round {}: submitted, {:?}", session.round(), report.verdict);
                (Some(report.verdict), report.effects)
            }
            None => (None, Vec::new()),
        })
        .await
    }
}
