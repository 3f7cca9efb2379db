// Agent service for business logic
//
// Ownership: update and delete only match agents owned by the requester, so
// a stranger's agent answers NotFound rather than revealing that it exists.

use agentdeck_core::llm_models::DEFAULT_MODEL;
use agentdeck_core::{
    Agent, AgentListItem, AgentPatch, ExecutionFilter, NewAgent, Store, StoreError,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::agents::{AgentDetail, CreateAgentRequest, UpdateAgentRequest};
use crate::api::validation::{
    trimmed, Validator, MAX_DESCRIPTION_BYTES, MAX_SYSTEM_PROMPT_BYTES, MIN_AGENT_NAME_CHARS,
};
use crate::api::{ApiError, ApiResult};

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const RECENT_EXECUTIONS: usize = 10;

pub struct AgentService {
    store: Arc<dyn Store>,
}

impl AgentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid) -> ApiResult<Vec<AgentListItem>> {
        Ok(self.store.list_agents(user_id).await?)
    }

    pub async fn create(&self, user_id: Uuid, req: CreateAgentRequest) -> ApiResult<Agent> {
        Validator::new()
            .required_name("name", req.name.as_deref(), MIN_AGENT_NAME_CHARS)
            .max_bytes("description", req.description.as_deref(), MAX_DESCRIPTION_BYTES)
            .max_bytes(
                "systemPrompt",
                req.system_prompt.as_deref(),
                MAX_SYSTEM_PROMPT_BYTES,
            )
            .temperature(req.temperature)
            .max_tokens(req.max_tokens)
            .model(req.model.as_deref())
            .tools(req.tools.as_deref())
            .triggers(req.triggers.as_deref())
            .finish()?;

        let name = trimmed(req.name).unwrap_or_default();
        let input = NewAgent {
            user_id,
            name: name.clone(),
            description: trimmed(req.description),
            agent_type: req.agent_type.unwrap_or_default(),
            model: trimmed(req.model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: req.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: req
                .max_tokens
                .map(|n| n as u32)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            system_prompt: trimmed(req.system_prompt),
            tools: normalize_tools(req.tools.unwrap_or_default()),
            triggers: req.triggers.unwrap_or_default(),
            is_public: req.is_public.unwrap_or(false),
        };

        let agent = self
            .store
            .create_agent(input)
            .await
            .map_err(|e| name_conflict(e, &name))?;

        tracing::info!(agent_id = %agent.id, user_id = %user_id, "agent created");
        Ok(agent)
    }

    /// Visible agent with its execution count and latest executions
    pub async fn get(&self, agent_id: Uuid, requester: Option<Uuid>) -> ApiResult<AgentDetail> {
        let agent = self.visible(agent_id, requester).await?;
        let execution_count = self.store.count_executions(agent_id).await?;
        let recent_executions = self
            .store
            .list_executions(ExecutionFilter::for_agent(agent_id, RECENT_EXECUTIONS))
            .await?;

        Ok(AgentDetail {
            agent,
            execution_count,
            recent_executions,
        })
    }

    /// Agent the requester may read and execute
    pub async fn visible(&self, agent_id: Uuid, requester: Option<Uuid>) -> ApiResult<Agent> {
        self.store
            .get_agent(agent_id)
            .await?
            .filter(|a| a.is_visible_to(requester))
            .ok_or_else(|| ApiError::not_found("Agent not found"))
    }

    pub async fn update(
        &self,
        agent_id: Uuid,
        user_id: Uuid,
        req: UpdateAgentRequest,
    ) -> ApiResult<Agent> {
        let mut validator = Validator::new();
        if let Some(name) = req.name.as_deref() {
            validator.name("name", name, MIN_AGENT_NAME_CHARS);
        }
        validator
            .max_bytes("description", req.description.as_deref(), MAX_DESCRIPTION_BYTES)
            .max_bytes(
                "systemPrompt",
                req.system_prompt.as_deref(),
                MAX_SYSTEM_PROMPT_BYTES,
            )
            .temperature(req.temperature)
            .max_tokens(req.max_tokens)
            .model(req.model.as_deref())
            .tools(req.tools.as_deref())
            .triggers(req.triggers.as_deref())
            .finish()?;

        self.owned(agent_id, user_id).await?;

        let name = req.name.as_deref().map(str::trim).map(str::to_string);
        let patch = AgentPatch {
            name: name.clone(),
            description: req.description.map(|d| d.trim().to_string()),
            agent_type: req.agent_type,
            status: req.status,
            model: req.model.map(|m| m.trim().to_string()),
            temperature: req.temperature,
            max_tokens: req.max_tokens.map(|n| n as u32),
            system_prompt: req.system_prompt.map(|p| p.trim().to_string()),
            tools: req.tools.map(normalize_tools),
            triggers: req.triggers,
            is_public: req.is_public,
        };

        let agent = self
            .store
            .update_agent(agent_id, patch)
            .await
            .map_err(|e| name_conflict(e, name.as_deref().unwrap_or_default()))?
            .ok_or_else(|| ApiError::not_found("Agent not found"))?;

        tracing::info!(agent_id = %agent.id, status = %agent.status, "agent updated");
        Ok(agent)
    }

    pub async fn delete(&self, agent_id: Uuid, user_id: Uuid) -> ApiResult<()> {
        self.owned(agent_id, user_id).await?;
        if !self.store.delete_agent(agent_id).await? {
            return Err(ApiError::not_found("Agent not found"));
        }
        tracing::info!(agent_id = %agent_id, "agent deleted");
        Ok(())
    }

    async fn owned(&self, agent_id: Uuid, user_id: Uuid) -> ApiResult<Agent> {
        self.store
            .get_agent(agent_id)
            .await?
            .filter(|a| a.is_owned_by(user_id))
            .ok_or_else(|| ApiError::not_found("Agent not found"))
    }
}

fn normalize_tools(tools: Vec<String>) -> Vec<String> {
    tools.into_iter().map(|t| t.trim().to_string()).collect()
}

fn name_conflict(err: StoreError, name: &str) -> ApiError {
    if err.is_conflict() {
        ApiError::conflict(format!("An agent named '{}' already exists", name))
    } else {
        err.into()
    }
}
