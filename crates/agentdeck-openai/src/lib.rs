// OpenAI-protocol client
//
// Talks to any OpenAI-compatible chat-completion endpoint; LLM7.io is the
// default. Implements the LlmClient trait from agentdeck-core so the API
// server never sees wire types.

mod client;
mod config;
mod types;

#[cfg(test)]
mod tests;

pub use client::OpenAiClient;
pub use config::{OpenAiConfig, DEFAULT_BASE_URL};

// Re-export core trait for convenience
pub use agentdeck_core::LlmClient;
