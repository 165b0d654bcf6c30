//! Shared round controller
//!
//! There is one round slot per server. Every connected socket observes and mutates the same
//! session. Async work (puzzle generation, judging, delayed effects) is tagged with the
//! generation it was started under and dropped if a newer round has replaced it by the time
//! it finishes.

mod challenge;
mod play;
mod round;

pub use round::RoundError;

use crate::generator::PuzzleGenerator;
use crate::judge::SemanticJudge;
use crate::protocol::{RoundSnapshot, ServerMessage};
use crate::session::{Effect, GameSession};
use crate::types::*;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinSet;

#[derive(Debug)]
pub enum RoundStatus {
    Idle,
    Loading,
    Failed(String),
    Active(GameSession),
}

#[derive(Debug)]
pub struct RoundSlot {
    pub generation: Generation,
    pub status: RoundStatus,
}

impl RoundSlot {
    pub fn session(&self) -> Option<&GameSession> {
        match &self.status {
            RoundStatus::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut GameSession> {
        match &mut self.status {
            RoundStatus::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        match &self.status {
            RoundStatus::Idle => RoundSnapshot::Idle,
            RoundStatus::Loading => RoundSnapshot::Loading {
                round: self.generation,
            },
            RoundStatus::Failed(message) => RoundSnapshot::Failed {
                round: self.generation,
                message: message.clone(),
            },
            RoundStatus::Active(session) => RoundSnapshot::Active(session.snapshot()),
        }
    }
}

/// Returned by mutators when there is no playable session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("No active round")]
pub struct NoActiveRound;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub round: Arc<RwLock<RoundSlot>>,
    /// Broadcast channel for state updates to every connected socket
    pub broadcast: broadcast::Sender<ServerMessage>,
    pub generator: Arc<dyn PuzzleGenerator>,
    pub judge: Arc<dyn SemanticJudge>,
    pub timing: TimingConfig,
    /// Pending delayed effects of the current round. Replacing the set aborts them.
    timers: Arc<Mutex<JoinSet<()>>>,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn PuzzleGenerator>,
        judge: Arc<dyn SemanticJudge>,
        timing: TimingConfig,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            round: Arc::new(RwLock::new(RoundSlot {
                generation: 0,
                status: RoundStatus::Idle,
            })),
            broadcast: tx,
            generator,
            judge,
            timing,
            timers: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub async fn snapshot(&self) -> RoundSnapshot {
        self.round.read().await.snapshot()
    }

    pub async fn generation(&self) -> Generation {
        self.round.read().await.generation
    }

    /// Send the current snapshot to every socket
    pub async fn broadcast_state(&self) {
        let snapshot = self.snapshot().await;
        // No receivers connected is fine
        let _ = self.broadcast.send(ServerMessage::State { snapshot });
    }

    fn timers(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Abort every pending effect
    fn cancel_timers(&self) {
        let mut timers = self.timers();
        let pending = timers.len();
        *timers = JoinSet::new();
        if pending > 0 {
            tracing::debug!("Cancelled {} pending effects", pending);
        }
    }

    /// Schedule session effects to fire after their delay
    fn schedule(&self, generation: Generation, effects: Vec<Effect>) {
        if effects.is_empty() {
            return;
        }

        let mut timers = self.timers();
        // Reap finished timers so the set does not grow over a long round
        while timers.try_join_next().is_some() {}

        for effect in effects {
            let delay = effect.delay(&self.timing);
            let state = self.clone();
            tracing::debug!(
                "Round {}: scheduling {:?} in {}ms",
                generation,
                effect,
                delay.as_millis()
            );
            timers.spawn(async move {
                tokio::time::sleep(delay).await;
                state.fire(generation, effect).await;
            });
        }
    }

    async fn fire(&self, generation: Generation, effect: Effect) {
        let follow_ups = {
            let mut slot = self.round.write().await;
            if slot.generation != generation {
                tracing::warn!(
                    "Dropping {:?} from round {} (current round {})",
                    effect,
                    generation,
                    slot.generation
                );
                return;
            }
            match slot.session_mut() {
                Some(session) => session.fire(effect),
                None => return,
            }
        };

        self.schedule(generation, follow_ups);
        self.broadcast_state().await;
    }

    /// Run a session operation under the write lock, schedule its effects and broadcast
    pub(crate) async fn with_session<T>(
        &self,
        op: impl FnOnce(&mut GameSession) -> (T, Vec<Effect>),
    ) -> Result<T, NoActiveRound> {
        let (generation, result, effects) = {
            let mut slot = self.round.write().await;
            let generation = slot.generation;
            let session = slot.session_mut().ok_or(NoActiveRound)?;
            let (result, effects) = op(session);
            (generation, result, effects)
        };

        self.schedule(generation, effects);
        self.broadcast_state().await;
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::generator::{GenerationError, PuzzleRequest};
    use crate::judge::{JudgeError, JudgeRequest, JudgeVerdict};
    use crate::puzzle::tests::sample_raw;
    use crate::puzzle::RawPuzzle;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Generator that always returns the sample puzzle, or fails when told to
    pub(crate) struct ScriptedGenerator {
        pub fail: bool,
    }

    #[async_trait]
    impl PuzzleGenerator for ScriptedGenerator {
        async fn generate(&self, _request: &PuzzleRequest) -> Result<RawPuzzle, GenerationError> {
            if self.fail {
                Err(GenerationError::Parse("scripted failure".to_string()))
            } else {
                Ok(sample_raw())
            }
        }
    }

    /// Judge that replays queued answers, erroring once the queue is empty
    #[derive(Default)]
    pub(crate) struct ScriptedJudge {
        answers: Mutex<VecDeque<Result<JudgeVerdict, JudgeError>>>,
    }

    impl ScriptedJudge {
        pub(crate) fn answering(answers: Vec<Result<JudgeVerdict, JudgeError>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
            }
        }
    }

    #[async_trait]
    impl SemanticJudge for ScriptedJudge {
        async fn judge(&self, _request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(JudgeError::Parse("no scripted answer".to_string())))
        }
    }

    pub(crate) fn verdict(is_match: bool, explanation: &str) -> Result<JudgeVerdict, JudgeError> {
        Ok(JudgeVerdict {
            is_match,
            explanation: explanation.to_string(),
        })
    }

    pub(crate) fn test_state(judge: ScriptedJudge) -> AppState {
        AppState::new(
            Arc::new(ScriptedGenerator { fail: false }),
            Arc::new(judge),
            TimingConfig::default(),
        )
    }

    /// Start a round and return it ready to play
    pub(crate) async fn active_state(judge: ScriptedJudge) -> AppState {
        let state = test_state(judge);
        state.start_round().await.unwrap();
        state
    }

    #[tokio::test]
    async fn test_new_state_is_idle() {
        let state = test_state(ScriptedJudge::default());
        assert_eq!(state.snapshot().await, RoundSnapshot::Idle);
        assert_eq!(state.generation().await, 0);
    }

    #[tokio::test]
    async fn test_mutators_need_active_round() {
        let state = test_state(ScriptedJudge::default());
        assert_eq!(state.select("apple").await, Err(NoActiveRound));
        assert_eq!(state.submit().await, Err(NoActiveRound));
        assert_eq!(state.guess("fruit").await, Err(NoActiveRound));
    }

    #[tokio::test]
    async fn test_mutations_are_broadcast() {
        let state = active_state(ScriptedJudge::default()).await;
        let mut rx = state.broadcast.subscribe();

        state.select("apple").await.unwrap();
        match rx.recv().await.unwrap() {
            ServerMessage::State { snapshot } => {
                let session = snapshot.session().unwrap();
                assert_eq!(session.selection, vec![Word::new("APPLE")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_is_dropped() {
        let state = active_state(ScriptedJudge::default()).await;
        for word in ["apple", "pear", "plum", "ford"] {
            state.select(word).await.unwrap();
        }

        // New round before the auto-submit fires
        state.start_round().await.unwrap();
        tokio::time::sleep(state.timing.auto_submit * 2).await;

        let snapshot = state.snapshot().await;
        let session = snapshot.session().unwrap();
        assert_eq!(session.round, 2);
        assert_eq!(session.mistakes_remaining, MAX_MISTAKES);
        assert!(session.selection.is_empty());
    }
}
