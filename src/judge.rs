//! Semantic judging of final-group names

use crate::llm::{strip_code_fences, CompletionRequest, LlmError, LlmManager};
use crate::types::{Word, GROUP_SIZE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A guess to be judged against the intended category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRequest {
    pub guess: String,
    pub category_name: String,
    pub words: [Word; GROUP_SIZE],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    #[serde(rename = "match")]
    pub is_match: bool,
    #[serde(default)]
    pub explanation: String,
}

impl JudgeVerdict {
    /// Verdict used when the judge cannot be reached: the player gets the benefit of the doubt
    pub fn benefit_of_the_doubt() -> Self {
        Self {
            is_match: true,
            explanation: "Could not verify, giving benefit of the doubt.".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("Judge call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Judge reply was not a verdict: {0}")]
    Parse(String),
}

#[async_trait]
pub trait SemanticJudge: Send + Sync {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError>;
}

/// Judge a guess, substituting an accepting verdict if the judge fails
pub async fn judge_or_accept(judge: &dyn SemanticJudge, request: &JudgeRequest) -> JudgeVerdict {
    match judge.judge(request).await {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::warn!(
                "Judge failed for guess '{}': {}. Accepting the guess.",
                request.guess,
                e
            );
            JudgeVerdict::benefit_of_the_doubt()
        }
    }
}

const JUDGE_SYSTEM_PROMPT: &str = r#"You judge whether a player's guess matches the intended category in a Connections word game. Be GENEROUS: accept answers that capture the same core idea even if worded differently. Synonyms, rephrasings, and partial matches that show understanding should be accepted.

Respond with ONLY valid JSON: {"match": true/false, "explanation": "brief reason"}"#;

/// LLM-backed judge
pub struct LlmJudge {
    llm: Arc<LlmManager>,
    model: Option<String>,
    timeout: Duration,
}

impl LlmJudge {
    pub fn new(llm: Arc<LlmManager>, model: Option<String>, timeout: Duration) -> Self {
        Self {
            llm,
            model,
            timeout,
        }
    }

    fn build_prompt(request: &JudgeRequest) -> String {
        let words: Vec<&str> = request.words.iter().map(Word::as_str).collect();
        format!(
            "The 4 words are: {}\nThe intended category name is: \"{}\"\nThe player guessed: \"{}\"\n\n\
             Does the player's guess capture the same connection? Be generous. If they clearly \
             understand the grouping, accept it.",
            words.join(", "),
            request.category_name,
            request.guess
        )
    }
}

/// Parse the judge's JSON reply
pub fn parse_verdict(text: &str) -> Result<JudgeVerdict, JudgeError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| JudgeError::Parse(e.to_string()))
}

#[async_trait]
impl SemanticJudge for LlmJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        let completion = CompletionRequest {
            system: JUDGE_SYSTEM_PROMPT.to_string(),
            prompt: Self::build_prompt(request),
            max_tokens: Some(200),
            timeout: self.timeout,
            model_override: self.model.clone(),
        };

        let response = self.llm.complete(completion).await?;
        let verdict = parse_verdict(&response.text)?;
        tracing::debug!(
            "Judged '{}' against '{}': match={}",
            request.guess,
            request.category_name,
            verdict.is_match
        );
        Ok(verdict)
    }
}
