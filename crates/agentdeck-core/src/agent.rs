// Agent domain types
//
// An agent binds a system prompt and generation parameters to a model so it
// can be executed against arbitrary input text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trigger::Trigger;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Agent category. Only a label: no type changes how an agent executes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    #[default]
    Chatbot,
    Automation,
    DataProcessor,
    ApiConnector,
    Scheduler,
    Monitor,
    Custom,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Chatbot => "CHATBOT",
            AgentType::Automation => "AUTOMATION",
            AgentType::DataProcessor => "DATA_PROCESSOR",
            AgentType::ApiConnector => "API_CONNECTOR",
            AgentType::Scheduler => "SCHEDULER",
            AgentType::Monitor => "MONITOR",
            AgentType::Custom => "CUSTOM",
        }
    }
}

/// Agent lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Active,
    #[default]
    Inactive,
    Paused,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "ACTIVE",
            AgentStatus::Inactive => "INACTIVE",
            AgentStatus::Paused => "PAUSED",
            AgentStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Names of the tools associated with this agent, in order
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Owners see their agents; everybody sees public ones
    pub fn is_visible_to(&self, requester: Option<Uuid>) -> bool {
        self.is_public || requester.is_some_and(|id| self.is_owned_by(id))
    }

    /// Only active agents accept execution requests
    pub fn is_runnable(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

/// Agent row in list responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AgentListItem {
    #[serde(flatten)]
    pub agent: Agent,
    pub execution_count: i64,
}

/// Input for creating an agent. New agents always start inactive.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub agent_type: AgentType,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub tools: Vec<String>,
    pub triggers: Vec<Trigger>,
    pub is_public: bool,
}

/// Whitelisted agent fields that may change after creation
#[derive(Debug, Clone, Default)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub agent_type: Option<AgentType>,
    pub status: Option<AgentStatus>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub tools: Option<Vec<String>>,
    pub triggers: Option<Vec<Trigger>>,
    pub is_public: Option<bool>,
}

impl AgentPatch {
    /// Apply the patch to an agent in place
    pub fn apply(self, agent: &mut Agent) {
        if let Some(name) = self.name {
            agent.name = name;
        }
        if let Some(description) = self.description {
            agent.description = Some(description);
        }
        if let Some(agent_type) = self.agent_type {
            agent.agent_type = agent_type;
        }
        if let Some(status) = self.status {
            agent.status = status;
        }
        if let Some(model) = self.model {
            agent.model = model;
        }
        if let Some(temperature) = self.temperature {
            agent.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            agent.max_tokens = max_tokens;
        }
        if let Some(system_prompt) = self.system_prompt {
            agent.system_prompt = Some(system_prompt);
        }
        if let Some(tools) = self.tools {
            agent.tools = tools;
        }
        if let Some(triggers) = self.triggers {
            agent.triggers = triggers;
        }
        if let Some(is_public) = self.is_public {
            agent.is_public = is_public;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent(owner: Uuid, is_public: bool) -> Agent {
        let now = Utc::now();
        Agent {
            id: Uuid::now_v7(),
            user_id: owner,
            name: "Bot".to_string(),
            description: None,
            agent_type: AgentType::Chatbot,
            status: AgentStatus::Inactive,
            model: "gpt-4o-mini-2024-07-18".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            system_prompt: None,
            tools: vec![],
            triggers: vec![],
            is_public,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_visibility() {
        let owner = Uuid::now_v7();
        let stranger = Uuid::now_v7();

        let private = agent(owner, false);
        assert!(private.is_visible_to(Some(owner)));
        assert!(!private.is_visible_to(Some(stranger)));
        assert!(!private.is_visible_to(None));

        let public = agent(owner, true);
        assert!(public.is_visible_to(Some(stranger)));
        assert!(public.is_visible_to(None));
    }

    #[test]
    fn test_only_active_agents_are_runnable() {
        let mut a = agent(Uuid::now_v7(), false);
        for status in [AgentStatus::Inactive, AgentStatus::Paused, AgentStatus::Error] {
            a.status = status;
            assert!(!a.is_runnable());
        }
        a.status = AgentStatus::Active;
        assert!(a.is_runnable());
    }

    #[test]
    fn test_wire_format_uses_screaming_enums() {
        let a = agent(Uuid::now_v7(), false);
        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["type"], json!("CHATBOT"));
        assert_eq!(value["status"], json!("INACTIVE"));
        assert_eq!(value["maxTokens"], json!(1000));
        assert_eq!(value["isPublic"], json!(false));

        let parsed: AgentType = serde_json::from_value(json!("DATA_PROCESSOR")).unwrap();
        assert_eq!(parsed, AgentType::DataProcessor);
        assert_eq!(parsed.as_str(), "DATA_PROCESSOR");
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut a = agent(Uuid::now_v7(), false);
        AgentPatch {
            status: Some(AgentStatus::Active),
            temperature: Some(0.0),
            ..Default::default()
        }
        .apply(&mut a);

        assert_eq!(a.status, AgentStatus::Active);
        assert_eq!(a.temperature, 0.0);
        assert_eq!(a.name, "Bot");
        assert_eq!(a.max_tokens, 1000);
    }
}
