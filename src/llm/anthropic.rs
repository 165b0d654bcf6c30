use super::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The messages API requires max_tokens on every request
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Anthropic messages provider. The base URL may also point at a proxy (e.g. a Cloudflare
/// worker holding the key), in which case no API key is needed locally.
pub struct AnthropicProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| LlmError::ConfigError(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            model,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    /// Concatenate the text blocks of the reply
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        model: Option<&str>,
    ) -> LlmResult<CompletionResponse> {
        let start = Instant::now();
        let model = model.unwrap_or(&self.model);

        let body = MessagesRequest {
            model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let mut http_request = self
            .client
            .post(&self.base_url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.header("x-api-key", api_key);
        }

        let response = tokio::time::timeout(request.timeout, http_request.send())
            .await
            .map_err(|_| LlmError::Timeout(request.timeout))?
            .map_err(|e| LlmError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::ApiError(format!(
                "Anthropic API returned status: {}",
                response.status()
            )));
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let text = reply.text();
        if text.trim().is_empty() {
            return Err(LlmError::ParseError("No text in response".to_string()));
        }

        Ok(CompletionResponse {
            text: text.trim().to_string(),
            metadata: ResponseMetadata {
                provider: "anthropic".to_string(),
                model: model.to_string(),
                tokens_used: reply.usage.map(|u| u.input_tokens + u.output_tokens),
                latency_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
