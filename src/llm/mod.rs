mod anthropic;
mod ollama;
mod openai;

use async_trait::async_trait;
use std::time::Duration;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// A single system + user prompt completion
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Instructions sent as the system message
    pub system: String,
    /// The user message
    pub prompt: String,
    /// Maximum response length in tokens (provider-dependent)
    pub max_tokens: Option<u32>,
    /// Timeout for the request
    pub timeout: Duration,
    /// Optional "provider:model" override (e.g., "openai:gpt-4o")
    pub model_override: Option<String>,
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The generated text
    pub text: String,
    pub metadata: ResponseMetadata,
}

/// Metadata about the LLM response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// Name of the provider (e.g., "openai", "ollama")
    pub provider: String,
    /// Model name used
    pub model: String,
    /// Tokens consumed (if available)
    pub tokens_used: Option<u32>,
    /// Latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a completion. `model` is the model to use, overriding the configured one if set.
    async fn complete(
        &self,
        request: CompletionRequest,
        model: Option<&str>,
    ) -> LlmResult<CompletionResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Manager for the configured LLM providers, in priority order
pub struct LlmManager {
    pub providers: Vec<Box<dyn LlmProvider>>,
}

impl LlmManager {
    /// Create a new LLM manager with the given providers
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// Run a completion.
    ///
    /// With a model override the request goes to that provider only. Otherwise providers are
    /// tried in order and the first success wins.
    pub async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        if let Some(model_id) = request.model_override.clone() {
            return self.complete_with_model(&model_id, request).await;
        }

        let mut last_error = None;
        for provider in &self.providers {
            match provider.complete(request.clone(), None).await {
                Ok(response) => {
                    tracing::debug!(
                        "Provider {} answered with {} in {}ms",
                        provider.name(),
                        response.metadata.model,
                        response.metadata.latency_ms
                    );
                    return Ok(response);
                }
                Err(e) => {
                    tracing::error!("Provider {} failed: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LlmError::ConfigError("No LLM providers configured".to_string())
        }))
    }

    /// Complete with a specific provider and model
    /// model_id format: "provider:model" (e.g., "openai:gpt-4o", "ollama:llama3.2")
    pub async fn complete_with_model(
        &self,
        model_id: &str,
        request: CompletionRequest,
    ) -> LlmResult<CompletionResponse> {
        let (provider_name, model_name) = model_id.split_once(':').ok_or_else(|| {
            LlmError::ConfigError(
                "Invalid model ID format, expected 'provider:model'".to_string(),
            )
        })?;

        let provider = self
            .providers
            .iter()
            .find(|p| p.name() == provider_name)
            .ok_or_else(|| {
                LlmError::ConfigError(format!("Provider '{}' not configured", provider_name))
            })?;

        provider.complete(request, Some(model_name)).await
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Ollama base URL
    pub ollama_base_url: Option<String>,
    /// Ollama model to use
    pub ollama_model: String,
    /// Anthropic API key (optional when the base URL is a keyless proxy)
    pub anthropic_api_key: Option<String>,
    /// Anthropic messages endpoint, or a proxy speaking the same format
    pub anthropic_base_url: Option<String>,
    /// Anthropic model to use
    pub anthropic_model: String,
    /// Default timeout for LLM requests
    pub default_timeout: Duration,
    /// "provider:model" used for puzzle generation
    pub generator_model: Option<String>,
    /// "provider:model" used for judging guesses
    pub judge_model: Option<String>,
}

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: Some("http://localhost:11434".to_string()),
            ollama_model: "llama3.2".to_string(),
            anthropic_api_key: None,
            anthropic_base_url: None,
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            default_timeout: Duration::from_secs(30),
            generator_model: None,
            judge_model: None,
        }
    }
}

/// Read a non-empty, trimmed environment variable
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ollama_base_url = match std::env::var("OLLAMA_BASE_URL") {
            Ok(url) => {
                let trimmed = url.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(_) => defaults.ollama_base_url.clone(),
        };

        let anthropic_api_key = env_value("ANTHROPIC_API_KEY");
        let anthropic_base_url = env_value("ANTHROPIC_BASE_URL").or_else(|| {
            anthropic_api_key
                .as_ref()
                .map(|_| DEFAULT_ANTHROPIC_URL.to_string())
        });

        Self {
            openai_api_key: env_value("OPENAI_API_KEY"),
            openai_model: env_value("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            ollama_base_url,
            ollama_model: env_value("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            anthropic_api_key,
            anthropic_base_url,
            anthropic_model: env_value("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            default_timeout: std::env::var("LLM_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            generator_model: env_value("GENERATOR_MODEL"),
            judge_model: env_value("JUDGE_MODEL"),
        }
    }

    /// Build an LlmManager with all configured providers
    pub fn build_manager(&self) -> LlmResult<LlmManager> {
        let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();

        if let Some(base_url) = &self.anthropic_base_url {
            providers.push(Box::new(AnthropicProvider::new(
                base_url.clone(),
                self.anthropic_api_key.clone(),
                self.anthropic_model.clone(),
            )?));
        }

        if let Some(api_key) = &self.openai_api_key {
            providers.push(Box::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
            )));
        }

        if let Some(base_url) = &self.ollama_base_url {
            providers.push(Box::new(OllamaProvider::new(
                base_url.clone(),
                self.ollama_model.clone(),
            )?));
        }

        if providers.is_empty() {
            return Err(LlmError::ConfigError(
                "No LLM providers configured. Set ANTHROPIC_API_KEY, OPENAI_API_KEY or OLLAMA_BASE_URL"
                    .to_string(),
            ));
        }

        Ok(LlmManager::new(providers))
    }
}

/// Pull the payload out of a Markdown code fence, wherever the fence starts. Text without a
/// fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text.trim();
    };
    let body = &text[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
