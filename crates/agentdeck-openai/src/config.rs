// Client configuration loaded from environment variables
// Decision: LLM_ prefix for all provider settings
// Decision: No client-side timeout unless LLM_TIMEOUT_SECS is set

use std::time::Duration;

/// LLM7.io OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://llm7.io/v1";

/// LLM7.io accepts any key for anonymous use
const DEFAULT_API_KEY: &str = "unused";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL without trailing slash, e.g. `https://llm7.io/v1`
    pub base_url: String,
    pub api_key: String,
    /// Personal token; sent instead of the API key when present
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            token: None,
            timeout: None,
        }
    }
}

impl OpenAiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let base_url = std::env::var("LLM_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let token = std::env::var("LLM_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let timeout = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            base_url,
            api_key,
            token,
            timeout,
        }
        .normalized()
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }

    /// Bearer credential: the token wins over the API key
    pub fn credential(&self) -> &str {
        self.token.as_deref().unwrap_or(&self.api_key)
    }
}
