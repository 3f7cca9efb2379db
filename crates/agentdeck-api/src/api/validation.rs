// Input validation for the public API
//
// Hard limits guard the service from oversized input. Unlike a fail-fast
// check, the Validator collects every violation so the console can show
// them all at once in `details`.

use agentdeck_core::Trigger;
use regex::Regex;
use std::sync::OnceLock;

use super::error::ApiError;

// =============================================================================
// Input Size Limits
// =============================================================================

/// Maximum size for agent and workflow names.
pub const MAX_NAME_BYTES: usize = 2 * 1024; // 2 KB

/// Maximum size for description fields.
pub const MAX_DESCRIPTION_BYTES: usize = 10 * 1024; // 10 KB

/// Maximum size for an agent system prompt.
pub const MAX_SYSTEM_PROMPT_BYTES: usize = 1024 * 1024; // 1 MB

/// Maximum number of tools that can be attached to an agent.
pub const MAX_AGENT_TOOLS: usize = 250;

/// Maximum size of one execution input.
pub const MAX_EXECUTION_INPUT_BYTES: usize = 1024 * 1024; // 1 MB

// =============================================================================
// Field rules
// =============================================================================

pub const MIN_AGENT_NAME_CHARS: usize = 3;
pub const MIN_WORKFLOW_NAME_CHARS: usize = 3;
pub const MIN_TOOL_NAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 6;

pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
pub const MAX_TOKENS_RANGE: (i64, i64) = (1, 100_000);

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email.trim()))
}

/// Accumulates validation failures
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.push(message.into());
        }
        self
    }

    /// Required text field with a minimum trimmed length
    pub fn required_name(
        &mut self,
        field: &str,
        value: Option<&str>,
        min_chars: usize,
    ) -> &mut Self {
        match value {
            Some(value) => self.name(field, value, min_chars),
            None => self.check(false, format!("{} is required", field)),
        }
    }

    pub fn name(&mut self, field: &str, value: &str, min_chars: usize) -> &mut Self {
        self.check(
            value.trim().chars().count() >= min_chars,
            format!("{} must be at least {} characters", field, min_chars),
        );
        self.max_bytes(field, Some(value), MAX_NAME_BYTES)
    }

    pub fn max_bytes(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            if value.len() > max {
                tracing::warn!(
                    "{} exceeds limit: {} bytes (max: {})",
                    field,
                    value.len(),
                    max
                );
                self.errors
                    .push(format!("{} exceeds the maximum size of {} bytes", field, max));
            }
        }
        self
    }

    pub fn temperature(&mut self, value: Option<f64>) -> &mut Self {
        if let Some(t) = value {
            let (min, max) = TEMPERATURE_RANGE;
            self.check(
                t.is_finite() && t >= min && t <= max,
                format!("temperature must be between {} and {}", min, max),
            );
        }
        self
    }

    pub fn max_tokens(&mut self, value: Option<i64>) -> &mut Self {
        if let Some(n) = value {
            let (min, max) = MAX_TOKENS_RANGE;
            self.check(
                (min..=max).contains(&n),
                format!("maxTokens must be between {} and {}", min, max),
            );
        }
        self
    }

    pub fn model(&mut self, value: Option<&str>) -> &mut Self {
        if let Some(model) = value {
            self.check(
                agentdeck_core::llm_models::is_known_model(model),
                format!("model '{}' is not supported", model),
            );
        }
        self
    }

    pub fn tools(&mut self, tools: Option<&[String]>) -> &mut Self {
        if let Some(tools) = tools {
            self.check(
                tools.len() <= MAX_AGENT_TOOLS,
                format!("at most {} tools can be attached", MAX_AGENT_TOOLS),
            );
            self.check(
                tools.iter().all(|t| !t.trim().is_empty()),
                "tool names must not be empty",
            );
        }
        self
    }

    pub fn triggers(&mut self, triggers: Option<&[Trigger]>) -> &mut Self {
        for trigger in triggers.unwrap_or_default() {
            if let Err(message) = trigger.validate() {
                self.errors.push(message);
            }
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Trim a string field, dropping it when it becomes empty
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(result: Result<(), ApiError>) -> Vec<String> {
        match result {
            Err(ApiError::BadRequest { details, .. }) => details,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(Validator::new().temperature(Some(0.0)).finish().is_ok());
        assert!(Validator::new().temperature(Some(2.0)).finish().is_ok());
        assert!(Validator::new().temperature(Some(2.0001)).finish().is_err());
        assert!(Validator::new().temperature(Some(-0.0001)).finish().is_err());
        assert!(Validator::new().temperature(Some(f64::NAN)).finish().is_err());
    }

    #[test]
    fn test_max_tokens_bounds() {
        assert!(Validator::new().max_tokens(Some(1)).finish().is_ok());
        assert!(Validator::new().max_tokens(Some(100_000)).finish().is_ok());
        assert!(Validator::new().max_tokens(Some(0)).finish().is_err());
        assert!(Validator::new().max_tokens(Some(100_001)).finish().is_err());
    }

    #[test]
    fn test_collects_all_violations() {
        let errors = details(
            Validator::new()
                .required_name("name", Some("  ab "), MIN_AGENT_NAME_CHARS)
                .temperature(Some(3.0))
                .model(Some("not-a-model"))
                .finish(),
        );
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_size_limits() {
        let big = "x".repeat(MAX_NAME_BYTES + 1);
        assert!(Validator::new().name("name", &big, 3).finish().is_err());
        let prompt = "x".repeat(MAX_SYSTEM_PROMPT_BYTES);
        assert!(Validator::new()
            .max_bytes("systemPrompt", Some(&prompt), MAX_SYSTEM_PROMPT_BYTES)
            .finish()
            .is_ok());
        let tools: Vec<String> = (0..=MAX_AGENT_TOOLS).map(|i| format!("t{}", i)).collect();
        assert!(Validator::new().tools(Some(&tools)).finish().is_err());
    }

    #[test]
    fn test_invalid_trigger() {
        let triggers = vec![Trigger::Schedule {
            cron: "* *".to_string(),
            description: None,
        }];
        assert!(Validator::new().triggers(Some(&triggers)).finish().is_err());
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("us er@example.com"));
    }
}
