// LLM Client Types
//
// Provider-agnostic chat-completion types plus the LlmClient trait that the
// execution handler talks to. The OpenAI-protocol implementation lives in
// agentdeck-openai; a scripted mock lives in memory.rs.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// ============================================================================
// LlmClient Trait
// ============================================================================

/// Stream of text fragments produced by a streamed completion.
/// Ends normally on the provider's end-of-stream marker.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Chat-completion provider
///
/// A single request is never retried by implementations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One-shot completion; the first choice's content is returned
    async fn chat_completion(&self, request: CompletionRequest) -> Result<Completion, LlmError>;

    /// Streamed completion yielding content deltas in order
    async fn chat_completion_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<TextStream, LlmError>;

    /// Models advertised by the provider
    async fn list_models(&self) -> Result<Vec<RemoteModel>, LlmError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Upstream failure. `status` is set when the provider answered with a
/// non-success HTTP status; transport failures and timeouts carry none.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct LlmError {
    pub status: Option<u16>,
    pub message: String,
}

impl LlmError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

// ============================================================================
// Messages and requests
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Optional system prompt followed by exactly one user message
    pub fn for_agent(
        model: impl Into<String>,
        system_prompt: Option<&str>,
        input: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
            messages.push(ChatMessage::system(prompt));
        }
        messages.push(ChatMessage::user(input));

        Self {
            model: model.into(),
            messages,
            temperature,
            max_tokens,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Token counts as reported by the provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub id: Option<String>,
    pub model: String,
    /// Content of the first choice
    pub content: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

/// Entry from the provider's model listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteModel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_with_system_prompt() {
        let request = CompletionRequest::for_agent("m", Some("be brief"), "hi", 0.5, 10);
        assert_eq!(
            request.messages,
            vec![ChatMessage::system("be brief"), ChatMessage::user("hi")]
        );
    }

    #[test]
    fn test_request_without_system_prompt() {
        let request = CompletionRequest::for_agent("m", None, "hi", 0.5, 10);
        assert_eq!(request.messages, vec![ChatMessage::user("hi")]);

        let blank = CompletionRequest::for_agent("m", Some("  "), "hi", 0.5, 10);
        assert_eq!(blank.messages.len(), 1);
    }

    #[test]
    fn test_role_wire_format() {
        let json = serde_json::to_value(ChatMessage::user("x")).unwrap();
        assert_eq!(json["role"], "user");
    }
}
