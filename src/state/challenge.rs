use super::{AppState, NoActiveRound};
use crate::judge::judge_or_accept;
use crate::session::GuessVerdict;

impl AppState {
    /// Name the last group. Returns the verdict once judged, or `None` if the guess was
    /// ignored or its round was replaced while the judge was thinking.
    pub async fn guess(&self, text: &str) -> Result<Option<GuessVerdict>, NoActiveRound> {
        let (generation, request) = {
            let mut slot = self.round.write().await;
            let generation = slot.generation;
            let session = slot.session_mut().ok_or(NoActiveRound)?;
            (generation, session.begin_guess(text))
        };
        let Some(request) = request else {
            return Ok(None);
        };

        tracing::info!("Round {}: judging guess '{}'", generation, request.guess);
        self.broadcast_state().await;

        // No lock is held while the judge runs
        let verdict = judge_or_accept(self.judge.as_ref(), &request).await;

        let (result, effects) = {
            let mut slot = self.round.write().await;
            if slot.generation != generation {
                tracing::warn!(
                    "Discarding verdict for round {} (current round {})",
                    generation,
                    slot.generation
                );
                return Ok(None);
            }
            let Some(session) = slot.session_mut() else {
                return Ok(None);
            };
            let effects = session.resolve_guess(verdict);
            let result = session.challenge().and_then(|c| c.verdict().cloned());
            (result, effects)
        };

        self.schedule(generation, effects);
        self.broadcast_state().await;
        Ok(result)
    }
}
