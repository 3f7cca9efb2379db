// OpenAI-protocol client implementation
//
// Implements the LlmClient trait from agentdeck-core. Requests are never
// retried; failures are surfaced to the caller as LlmError.

use crate::config::OpenAiConfig;
use crate::types::{ChatRequest, ChatResponse, ErrorResponse, ModelsResponse, StreamChunk};
use agentdeck_core::{
    Completion, CompletionRequest, LlmClient, LlmError, RemoteModel, TextStream,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use reqwest::{Client, Response};
use tracing::{debug, warn};

/// End-of-stream marker sent as the last SSE `data:` frame
const DONE_MARKER: &str = "[DONE]";

/// LLM client for OpenAI-compatible endpoints
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Create a client configured from LLM_* environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env())
    }

    /// Create a client for a custom endpoint with default credentials
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(OpenAiConfig::with_base_url(base_url))
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    async fn post_chat(&self, request: &CompletionRequest, stream: bool) -> Result<Response, LlmError> {
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        };

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            stream,
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(self.config.credential())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("chat completion request failed", e))?;

        ensure_success(response).await
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> LlmError {
    warn!(error = %err, "{}", context);
    if err.is_timeout() {
        LlmError::new(format!("{}: request timed out", context))
    } else {
        LlmError::new(format!("{}: {}", context, err))
    }
}

/// Turn a non-success response into an LlmError carrying its status
async fn ensure_success(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.into_message())
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });

    warn!(status = status.as_u16(), error = %message, "LLM provider returned an error");
    Err(LlmError::with_status(
        status.as_u16(),
        format!("LLM API error ({}): {}", status.as_u16(), message),
    ))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let response = self.post_chat(&request, false).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::new(format!("Failed to parse completion response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::new("Completion response contained no choices"))?;

        Ok(Completion {
            id: parsed.id,
            model: parsed.model.unwrap_or(request.model),
            content: choice.message.content.unwrap_or_default(),
            usage: parsed.usage.map(Into::into),
            finish_reason: choice.finish_reason,
        })
    }

    async fn chat_completion_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<TextStream, LlmError> {
        let response = self.post_chat(&request, true).await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                future::ready(!matches!(event, Ok(event) if event.data.trim() == DONE_MARKER))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => match serde_json::from_str::<StreamChunk>(&event.data) {
                        Ok(chunk) => chunk.into_content().map(Ok),
                        Err(e) => {
                            debug!(error = %e, "skipping malformed stream chunk");
                            None
                        }
                    },
                    Err(e) => Some(Err(LlmError::new(format!("Stream read failed: {}", e)))),
                })
            });

        Ok(Box::pin(stream))
    }

    async fn list_models(&self) -> Result<Vec<RemoteModel>, LlmError> {
        let response = self
            .client
            .get(self.url("models"))
            .bearer_auth(self.config.credential())
            .send()
            .await
            .map_err(|e| transport_error("model listing request failed", e))?;

        let response = ensure_success(response).await?;
        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::new(format!("Failed to parse model listing: {}", e)))?;

        Ok(models.into_models())
    }
}
