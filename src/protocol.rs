use crate::matcher::MatchVerdict;
use crate::session::GuessVerdict;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Abandon the current round and generate a new puzzle
    NewRound,
    Select {
        word: String,
    },
    Deselect {
        word: String,
    },
    /// Tile tap: select or deselect depending on current state
    Toggle {
        word: String,
    },
    DeselectAll,
    Shuffle,
    Submit,
    /// Name the last remaining group
    Guess {
        text: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        snapshot: RoundSnapshot,
        server_now: String,
    },
    /// Broadcast after every state change
    State {
        snapshot: RoundSnapshot,
    },
    /// Sent to the submitting socket
    SubmitResult {
        verdict: MatchVerdict,
    },
    GuessJudged {
        verdict: GuessVerdict,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

/// Presentation tier of a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierInfo {
    pub label: String,
    pub color: String,
}

impl From<Tier> for TierInfo {
    fn from(tier: Tier) -> Self {
        Self {
            label: tier.label().to_string(),
            color: tier.color().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedInfo {
    pub id: CategoryId,
    pub name: String,
    pub words: Vec<Word>,
    pub tier: TierInfo,
}

impl From<&Category> for SolvedInfo {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            words: c.words.to_vec(),
            tier: TierInfo::from(c.tier()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseView {
    Playing,
    FinalChallenge {
        /// Words of the last group, shown while the player names it
        words: Vec<Word>,
        attempts_left: u8,
        judging: bool,
        verdict: Option<GuessVerdict>,
    },
    GameOver {
        won: bool,
    },
}

/// Everything a client needs to render the round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub round: Generation,
    /// Tier per category, in puzzle order
    pub tiers: Vec<TierInfo>,
    /// Unsolved words in display order
    pub board: Vec<Word>,
    /// Solved categories in solve order
    pub solved: Vec<SolvedInfo>,
    pub selection: Vec<Word>,
    /// Words from the last wrong guess, until the shake clears
    pub shake: Vec<Word>,
    pub one_away: bool,
    pub last_verdict: Option<MatchVerdict>,
    pub mistakes_remaining: u8,
    pub phase: PhaseView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundSnapshot {
    Idle,
    Loading { round: Generation },
    Failed { round: Generation, message: String },
    Active(SessionSnapshot),
}

impl RoundSnapshot {
    pub fn session(&self) -> Option<&SessionSnapshot> {
        match self {
            RoundSnapshot::Active(session) => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t": "toggle", "word": " gold "}"#).unwrap();
        match msg {
            ClientMessage::Toggle { word } => assert_eq!(word, " gold "),
            other => panic!("unexpected {:?}", other),
        }

        let msg: ClientMessage = serde_json::from_str(r#"{"t": "deselect_all"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::DeselectAll));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t": "guess", "text": "metals"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Guess { text } if text == "metals"));
    }

    #[test]
    fn test_round_snapshot_status_tag() {
        let json = serde_json::to_value(RoundSnapshot::Loading { round: 3 }).unwrap();
        assert_eq!(json["status"], "loading");
        assert_eq!(json["round"], 3);

        let json = serde_json::to_value(RoundSnapshot::Idle).unwrap();
        assert_eq!(json["status"], "idle");
    }

    #[test]
    fn test_active_snapshot_flattens_session() {
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(1);
        let session =
            crate::session::GameSession::new(crate::puzzle::tests::sample_puzzle(), 5, &mut rng);
        let json = serde_json::to_value(RoundSnapshot::Active(session.snapshot())).unwrap();

        assert_eq!(json["status"], "active");
        assert_eq!(json["round"], 5);
        assert_eq!(json["board"].as_array().unwrap().len(), 16);
        assert_eq!(json["mistakes_remaining"], 4);
        assert_eq!(json["phase"]["phase"], "playing");
        assert_eq!(json["tiers"][0]["color"], "#F9DF6D");
    }

    #[test]
    fn test_error_message_shape() {
        let json = serde_json::to_value(ServerMessage::error("NO_ACTIVE_ROUND", "no round"))
            .unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "NO_ACTIVE_ROUND");
    }
}
