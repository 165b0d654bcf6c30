use super::{AppState, RoundStatus};
use crate::generator::{pick_topics, GenerationError, PuzzleRequest};
use crate::puzzle::{validate, ValidationError};
use crate::session::GameSession;
use crate::types::*;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A newer round was started while this one was generating
    #[error("Round {0} was superseded")]
    Superseded(Generation),
}

impl AppState {
    /// Start a new round and wait for its puzzle.
    ///
    /// The previous round is discarded right away: its pending effects are aborted and any
    /// judge call still in flight will be ignored when it returns. On failure the slot is left
    /// in the failed state so the client can offer a retry.
    pub async fn start_round(&self) -> Result<Generation, RoundError> {
        let request = {
            let mut slot = self.round.write().await;
            slot.generation += 1;
            slot.status = RoundStatus::Loading;
            self.cancel_timers();
            PuzzleRequest {
                round: slot.generation,
                topics: pick_topics(&mut rand::rng()),
            }
        };
        let generation = request.round;
        tracing::info!("Starting round {}", generation);
        self.broadcast_state().await;

        let outcome = match self.generator.generate(&request).await {
            Ok(raw) => validate(&raw).map_err(RoundError::from),
            Err(e) => Err(RoundError::from(e)),
        };

        {
            let mut slot = self.round.write().await;
            if slot.generation != generation {
                tracing::warn!(
                    "Discarding puzzle for round {} (current round {})",
                    generation,
                    slot.generation
                );
                return Err(RoundError::Superseded(generation));
            }

            slot.status = match &outcome {
                Ok(puzzle) => {
                    tracing::info!("Round {} ready", generation);
                    RoundStatus::Active(GameSession::new(
                        puzzle.clone(),
                        generation,
                        &mut rand::rng(),
                    ))
                }
                Err(e) => {
                    tracing::error!("Round {} failed: {}", generation, e);
                    RoundStatus::Failed(e.to_string())
                }
            };
        }

        self.broadcast_state().await;
        outcome.map(|_| generation)
    }

    /// Start a new round in the background
    pub fn spawn_round(self: &Arc<Self>) {
        let state = self.clone();
        tokio::spawn(async move {
            // Failures are already recorded in the slot and broadcast
            let _ = state.start_round().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{test_state, ScriptedGenerator, ScriptedJudge};
    use super::*;
    use crate::generator::PuzzleGenerator;
    use crate::protocol::RoundSnapshot;
    use crate::puzzle::tests::sample_raw;
    use crate::puzzle::RawPuzzle;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_start_round_activates_session() {
        let state = test_state(ScriptedJudge::default());
        assert_eq!(state.start_round().await.unwrap(), 1);

        let snapshot = state.snapshot().await;
        let session = snapshot.session().unwrap();
        assert_eq!(session.round, 1);
        assert_eq!(session.board.len(), 16);
    }

    #[tokio::test]
    async fn test_generator_failure_marks_round_failed() {
        let state = AppState::new(
            Arc::new(ScriptedGenerator { fail: true }),
            Arc::new(ScriptedJudge::default()),
            TimingConfig::default(),
        );

        assert!(matches!(
            state.start_round().await,
            Err(RoundError::Generation(_))
        ));
        assert!(matches!(
            state.snapshot().await,
            RoundSnapshot::Failed { round: 1, .. }
        ));
    }

    struct InvalidGenerator;

    #[async_trait]
    impl PuzzleGenerator for InvalidGenerator {
        async fn generate(&self, _request: &PuzzleRequest) -> Result<RawPuzzle, GenerationError> {
            let mut raw = sample_raw();
            raw.categories.as_mut().unwrap().truncate(3);
            Ok(raw)
        }
    }

    #[tokio::test]
    async fn test_invalid_puzzle_marks_round_failed() {
        let state = AppState::new(
            Arc::new(InvalidGenerator),
            Arc::new(ScriptedJudge::default()),
            TimingConfig::default(),
        );

        assert!(matches!(
            state.start_round().await,
            Err(RoundError::Validation(ValidationError::Shape(_)))
        ));
        match state.snapshot().await {
            RoundSnapshot::Failed { message, .. } => assert!(message.contains("categories")),
            other => panic!("unexpected {:?}", other),
        }
    }

    /// Holds the first request until released
    struct GatedGenerator {
        gate: Notify,
    }

    #[async_trait]
    impl PuzzleGenerator for GatedGenerator {
        async fn generate(&self, request: &PuzzleRequest) -> Result<RawPuzzle, GenerationError> {
            if request.round == 1 {
                self.gate.notified().await;
            }
            Ok(sample_raw())
        }
    }

    #[tokio::test]
    async fn test_superseded_round_is_discarded() {
        let generator = Arc::new(GatedGenerator {
            gate: Notify::new(),
        });
        let state = Arc::new(AppState::new(
            generator.clone(),
            Arc::new(ScriptedJudge::default()),
            TimingConfig::default(),
        ));

        let first = tokio::spawn({
            let state = state.clone();
            async move { state.start_round().await }
        });
        while !matches!(state.snapshot().await, RoundSnapshot::Loading { round: 1 }) {
            tokio::task::yield_now().await;
        }

        assert_eq!(state.start_round().await.unwrap(), 2);
        generator.gate.notify_one();

        assert!(matches!(
            first.await.unwrap(),
            Err(RoundError::Superseded(1))
        ));
        assert_eq!(state.snapshot().await.session().unwrap().round, 2);
    }
}
