//! Puzzle generation
//!
//! Each round asks the generator for a puzzle whose four groups come from four different
//! topics, drawn without replacement from a fixed catalog.

use crate::llm::{strip_code_fences, CompletionRequest, LlmError, LlmManager};
use crate::puzzle::RawPuzzle;
use crate::types::{Generation, CATEGORY_COUNT};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: &'static str,
    pub description: &'static str,
}

/// Topic catalog puzzles are drawn from
pub const TOPICS: &[Topic] = &[
    Topic {
        id: "finance",
        description: "finance & investing (Wall Street, markets, trading, portfolio management, Bloomberg jargon)",
    },
    Topic {
        id: "washington",
        description: "Washington DC (politics, government, Beltway culture, monuments, agencies, Congressional procedure)",
    },
    Topic {
        id: "business_school",
        description: "Harvard Business School (MBA culture, case method, strategy frameworks, famous alumni, recruiting)",
    },
    Topic {
        id: "soccer",
        description: "English Premier League & world soccer (EPL clubs, players past & present, tactics, transfers, football culture)",
    },
    Topic {
        id: "sports_betting",
        description: "sports betting (odds, parlays, spreads, sharps, props, line movement, sportsbook culture)",
    },
    Topic {
        id: "boating",
        description: "boating & fishing (nautical terms, tackle, fish species, boat types, knots, maritime lingo)",
    },
    Topic {
        id: "eighties_nineties",
        description: "1980s and 1990s trivia (pop culture, movies, music, TV shows, toys, fashion, tech of the era)",
    },
    Topic {
        id: "foreign_affairs",
        description: "foreign affairs (diplomacy, international orgs, geopolitics, treaties, doctrines, world leaders)",
    },
    Topic {
        id: "current_events",
        description: "current events & politics 2024-2025 (recent headlines, elections, policy debates, figures in the news)",
    },
];

/// Pick one distinct topic per category
pub fn pick_topics<R: Rng + ?Sized>(rng: &mut R) -> [Topic; CATEGORY_COUNT] {
    let mut picked = TOPICS.choose_multiple(rng, CATEGORY_COUNT).copied();
    std::array::from_fn(|_| picked.next().unwrap_or(TOPICS[0]))
}

/// What the generator is asked for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuzzleRequest {
    /// Round counter; makes every request distinct
    pub round: Generation,
    pub topics: [Topic; CATEGORY_COUNT],
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Puzzle generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Generated puzzle was not valid JSON: {0}")]
    Parse(String),
}

#[async_trait]
pub trait PuzzleGenerator: Send + Sync {
    async fn generate(&self, request: &PuzzleRequest) -> Result<RawPuzzle, GenerationError>;
}

/// Parse the generator's JSON reply
pub fn parse_puzzle(text: &str) -> Result<RawPuzzle, GenerationError> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| GenerationError::Parse(e.to_string()))
}

/// LLM-backed puzzle generator
pub struct LlmPuzzleGenerator {
    llm: Arc<LlmManager>,
    model: Option<String>,
    timeout: Duration,
}

impl LlmPuzzleGenerator {
    pub fn new(llm: Arc<LlmManager>, model: Option<String>, timeout: Duration) -> Self {
        Self {
            llm,
            model,
            timeout,
        }
    }

    pub fn system_prompt(topics: &[Topic; CATEGORY_COUNT]) -> String {
        let topic_list: String = topics
            .iter()
            .enumerate()
            .map(|(i, topic)| format!("{}. {}\n", i + 1, topic.description))
            .collect();

        format!(
            r#"You are a devious puzzle designer for a word game called "Connections" (like the NYT game).

Each of the 4 groups draws from a DIFFERENT topic domain. The 4 topics for this puzzle are:
{topic_list}
Create 4 groups of 4 words each. Each group shares a hidden connection drawn from its assigned topic.

CROSS-OVER POTENTIAL IS THE MOST IMPORTANT RULE:
You MUST choose words that have strong cross-over potential across multiple topic domains. Every word should plausibly fit in at least 2 groups.

Examples of ideal cross-over words:
- "PITCH" could be soccer (pitch = field), finance (pitch deck), boating (pitch of a hull), betting (sales pitch)
- "ARSENAL" could be soccer (club), DC (military), foreign affairs (weapons)
- "SPREAD" could be betting (point spread), finance (bid-ask spread), fishing (spread bait)
- "COVER" could be betting (cover the spread), finance (short cover), 80s/90s (cover band)
- "HEDGE" could be finance (hedge fund), boating (hedge a bet), foreign affairs (hedge strategy)

Aim for AT LEAST 8 of the 16 words to have plausible cross-over appeal. The player should constantly second-guess which group a word belongs to.

DIFFICULTY MIX:
- Include a mix of easy, medium, and hard categories
- At least one category should be accessible (obvious once you see it)
- At least one should be very tricky (wordplay, hidden patterns, or obscure connections)
- The hardest category (difficulty 4) should be especially clever and surprising but fair

RULES:
- Words should be 1-2 words max, ALL CAPS
- Categories should be clever: use wordplay, puns, double meanings, "___ X" patterns, hidden structural patterns, or surprisingly specific groupings
- The category NAME should be specific and descriptive (not vague)
- All 16 words must be unique
- Do NOT make categories that are just "things related to [topic]"; be more specific and clever

Respond with ONLY valid JSON in this exact format, no other text:
{{
  "categories": [
    {{"name": "Category Name", "difficulty": 1, "words": ["WORD1", "WORD2", "WORD3", "WORD4"]}},
    {{"name": "Category Name", "difficulty": 2, "words": ["WORD1", "WORD2", "WORD3", "WORD4"]}},
    {{"name": "Category Name", "difficulty": 3, "words": ["WORD1", "WORD2", "WORD3", "WORD4"]}},
    {{"name": "Category Name", "difficulty": 4, "words": ["WORD1", "WORD2", "WORD3", "WORD4"]}}
  ]
}}

difficulty 1 = easiest (yellow), 2 = medium (green), 3 = hard (blue), 4 = hardest (purple)"#
        )
    }

    pub fn user_prompt(round: Generation) -> String {
        format!(
            "Generate Connections puzzle #{}. Remember: each group from a different topic, mixed \
             difficulty, clever red herrings across domains. The hardest category should have a \
             connection that's surprising but nameable. Surprise me!",
            round
        )
    }
}

#[async_trait]
impl PuzzleGenerator for LlmPuzzleGenerator {
    async fn generate(&self, request: &PuzzleRequest) -> Result<RawPuzzle, GenerationError> {
        let topic_ids: Vec<&str> = request.topics.iter().map(|t| t.id).collect();
        tracing::info!(
            "Generating puzzle #{} from topics {:?}",
            request.round,
            topic_ids
        );

        let completion = CompletionRequest {
            system: Self::system_prompt(&request.topics),
            prompt: Self::user_prompt(request.round),
            max_tokens: Some(1000),
            timeout: self.timeout,
            model_override: self.model.clone(),
        };

        let response = self.llm.complete(completion).await?;
        tracing::debug!(
            "Puzzle #{} generated by {}:{} in {}ms",
            request.round,
            response.metadata.provider,
            response.metadata.model,
            response.metadata.latency_ms
        );
        parse_puzzle(&response.text)
    }
}
