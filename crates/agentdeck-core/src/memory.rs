// In-memory implementations for examples and testing
//
// InMemoryStore implements every store trait over one shared state so the
// cascade rules behave like the database. MockLlmClient replays scripted
// responses and records the requests it received.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::agent::{Agent, AgentListItem, AgentPatch, NewAgent};
use crate::analytics::{Analytics, AnalyticsFilter, NewAnalytics};
use crate::error::{StoreError, StoreResult};
use crate::execution::{
    Execution, ExecutionFilter, ExecutionLog, ExecutionOutcome, ExecutionStats, ExecutionStatus,
    NewExecution, NewExecutionLog,
};
use crate::llm::{
    Completion, CompletionRequest, LlmClient, LlmError, RemoteModel, TextStream, TokenUsage,
};
use crate::tool::{NewTool, Tool, ToolFilter, ToolPatch};
use crate::traits::{
    AgentStore, AnalyticsStore, ExecutionStore, ToolStore, UserStore, WorkflowStore,
};
use crate::user::{NewUser, User, UserCredentials};
use crate::workflow::{NewWorkflow, Workflow, WorkflowPatch};

// ============================================================================
// InMemoryStore
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, UserCredentials>,
    agents: HashMap<Uuid, Agent>,
    executions: HashMap<Uuid, Execution>,
    logs: Vec<ExecutionLog>,
    analytics: Vec<Analytics>,
    tools: HashMap<Uuid, Tool>,
    workflows: HashMap<Uuid, Workflow>,
}

impl MemoryState {
    fn require_user(&self, user_id: Uuid) -> StoreResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::invalid_reference(format!(
                "user {} does not exist",
                user_id
            )))
        }
    }

    fn agent_name_taken(&self, user_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.agents
            .values()
            .any(|a| a.user_id == user_id && a.name == name && Some(a.id) != except)
    }

    fn workflow_name_taken(&self, user_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.workflows
            .values()
            .any(|w| w.user_id == user_id && w.name == name && Some(w.id) != except)
    }
}

/// Store backed by process memory
///
/// Cloning shares the underlying state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, input: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let email = input.email.trim().to_lowercase();
        if state.users.values().any(|c| c.user.email == email) {
            return Err(StoreError::conflict(format!(
                "user with email '{}' already exists",
                email
            )));
        }

        let user = User {
            id: Uuid::now_v7(),
            email,
            name: input.name,
            avatar: input.avatar,
            role: input.role,
            created_at: Utc::now(),
        };
        state.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: input.password_hash,
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|c| c.user.clone()))
    }

    async fn get_user_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let email = email.trim().to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }
}

#[async_trait]
impl AgentStore for InMemoryStore {
    async fn create_agent(&self, input: NewAgent) -> StoreResult<Agent> {
        let mut state = self.state.write().await;
        state.require_user(input.user_id)?;
        if state.agent_name_taken(input.user_id, &input.name, None) {
            return Err(StoreError::conflict(format!(
                "agent named '{}' already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let agent = Agent {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            name: input.name,
            description: input.description,
            agent_type: input.agent_type,
            status: Default::default(),
            model: input.model,
            temperature: input.temperature,
            max_tokens: input.max_tokens,
            system_prompt: input.system_prompt,
            tools: input.tools,
            triggers: input.triggers,
            is_public: input.is_public,
            created_at: now,
            updated_at: now,
        };
        state.agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn get_agent(&self, id: Uuid) -> StoreResult<Option<Agent>> {
        let state = self.state.read().await;
        Ok(state.agents.get(&id).cloned())
    }

    async fn list_agents(&self, user_id: Uuid) -> StoreResult<Vec<AgentListItem>> {
        let state = self.state.read().await;
        let mut items: Vec<AgentListItem> = state
            .agents
            .values()
            .filter(|a| a.user_id == user_id)
            .map(|a| AgentListItem {
                agent: a.clone(),
                execution_count: state
                    .executions
                    .values()
                    .filter(|e| e.agent_id == a.id)
                    .count() as i64,
            })
            .collect();
        items.sort_by(|a, b| {
            (b.agent.updated_at, b.agent.id).cmp(&(a.agent.updated_at, a.agent.id))
        });
        Ok(items)
    }

    async fn update_agent(&self, id: Uuid, patch: AgentPatch) -> StoreResult<Option<Agent>> {
        let mut state = self.state.write().await;
        let Some(user_id) = state.agents.get(&id).map(|a| a.user_id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            if state.agent_name_taken(user_id, name, Some(id)) {
                return Err(StoreError::conflict(format!(
                    "agent named '{}' already exists",
                    name
                )));
            }
        }

        let Some(agent) = state.agents.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(agent);
        agent.updated_at = Utc::now();
        Ok(Some(agent.clone()))
    }

    async fn delete_agent(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.agents.remove(&id).is_none() {
            return Ok(false);
        }

        let removed: Vec<Uuid> = state
            .executions
            .values()
            .filter(|e| e.agent_id == id)
            .map(|e| e.id)
            .collect();
        for execution_id in &removed {
            state.executions.remove(execution_id);
        }
        state.logs.retain(|l| !removed.contains(&l.execution_id));

        for event in state.analytics.iter_mut() {
            if event.agent_id == Some(id) {
                event.agent_id = None;
            }
        }
        for workflow in state.workflows.values_mut() {
            for step in workflow.steps.iter_mut() {
                if step.agent_id == Some(id) {
                    step.agent_id = None;
                }
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ExecutionStore for InMemoryStore {
    async fn create_execution(&self, input: NewExecution) -> StoreResult<Execution> {
        let mut state = self.state.write().await;
        state.require_user(input.user_id)?;
        if !state.agents.contains_key(&input.agent_id) {
            return Err(StoreError::invalid_reference(format!(
                "agent {} does not exist",
                input.agent_id
            )));
        }
        let execution = Execution::start(Uuid::now_v7(), input);
        state.executions.insert(execution.id, execution.clone());
        Ok(execution)
    }

    async fn finish_execution(
        &self,
        id: Uuid,
        outcome: ExecutionOutcome,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<Option<Execution>> {
        let mut state = self.state.write().await;
        let Some(execution) = state.executions.get_mut(&id) else {
            return Ok(None);
        };
        if execution.finish(outcome, finished_at) {
            Ok(Some(execution.clone()))
        } else {
            Ok(None)
        }
    }

    async fn get_execution(&self, id: Uuid) -> StoreResult<Option<Execution>> {
        let state = self.state.read().await;
        Ok(state.executions.get(&id).cloned())
    }

    async fn list_executions(&self, filter: ExecutionFilter) -> StoreResult<Vec<Execution>> {
        let state = self.state.read().await;
        let mut executions: Vec<Execution> = state
            .executions
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        executions.sort_by(|a, b| (b.started_at, b.id).cmp(&(a.started_at, a.id)));
        executions.truncate(filter.limit);
        Ok(executions)
    }

    async fn count_executions(&self, agent_id: Uuid) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .executions
            .values()
            .filter(|e| e.agent_id == agent_id)
            .count() as i64)
    }

    async fn execution_stats(
        &self,
        user_id: Uuid,
        today_start: DateTime<Utc>,
        week_start: DateTime<Utc>,
    ) -> StoreResult<ExecutionStats> {
        let state = self.state.read().await;
        let mut stats = ExecutionStats::default();
        for execution in state.executions.values().filter(|e| e.user_id == user_id) {
            stats.total += 1;
            if execution.started_at >= today_start {
                stats.today += 1;
            }
            if execution.started_at >= week_start {
                stats.this_week += 1;
            }
            match execution.status {
                ExecutionStatus::Running => stats.running += 1,
                ExecutionStatus::Success => stats.success += 1,
                ExecutionStatus::Failed => stats.failed += 1,
                ExecutionStatus::Cancelled => stats.cancelled += 1,
            }
        }
        Ok(stats)
    }

    async fn append_log(&self, input: NewExecutionLog) -> StoreResult<ExecutionLog> {
        let log = ExecutionLog {
            id: Uuid::now_v7(),
            execution_id: input.execution_id,
            level: input.level,
            message: input.message,
            data: input.data,
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.logs.push(log.clone());
        Ok(log)
    }

    async fn list_logs(&self, execution_id: Uuid) -> StoreResult<Vec<ExecutionLog>> {
        let state = self.state.read().await;
        Ok(state
            .logs
            .iter()
            .filter(|l| l.execution_id == execution_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryStore {
    async fn record_analytics(&self, input: NewAnalytics) -> StoreResult<Analytics> {
        let event = Analytics {
            id: Uuid::now_v7(),
            analytics_type: input.analytics_type,
            data: input.data,
            user_id: input.user_id,
            agent_id: input.agent_id,
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.analytics.push(event.clone());
        Ok(event)
    }

    async fn list_analytics(&self, filter: AnalyticsFilter) -> StoreResult<Vec<Analytics>> {
        let state = self.state.read().await;
        let events = state
            .analytics
            .iter()
            .rev()
            .filter(|a| filter.matches(a))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(events)
    }

    async fn total_tokens(&self, user_id: Uuid) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .analytics
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(Analytics::total_tokens)
            .sum())
    }
}

#[async_trait]
impl ToolStore for InMemoryStore {
    async fn create_tool(&self, input: NewTool) -> StoreResult<Tool> {
        let mut state = self.state.write().await;
        if state.tools.values().any(|t| t.name == input.name) {
            return Err(StoreError::conflict(format!(
                "tool named '{}' already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let tool = Tool {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            tool_type: input.tool_type,
            config: input.config,
            schema: input.schema,
            is_built_in: input.is_built_in,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        state.tools.insert(tool.id, tool.clone());
        Ok(tool)
    }

    async fn upsert_builtin_tool(&self, input: NewTool) -> StoreResult<Tool> {
        {
            let mut state = self.state.write().await;
            if let Some(tool) = state.tools.values_mut().find(|t| t.name == input.name) {
                tool.description = input.description;
                tool.tool_type = input.tool_type;
                tool.config = input.config;
                tool.schema = input.schema;
                tool.is_built_in = true;
                tool.updated_at = Utc::now();
                return Ok(tool.clone());
            }
        }
        self.create_tool(NewTool {
            is_built_in: true,
            ..input
        })
        .await
    }

    async fn get_tool(&self, id: Uuid) -> StoreResult<Option<Tool>> {
        let state = self.state.read().await;
        Ok(state.tools.get(&id).cloned())
    }

    async fn list_tools(&self, filter: ToolFilter) -> StoreResult<Vec<Tool>> {
        let state = self.state.read().await;
        let mut tools: Vec<Tool> = state
            .tools
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tools.sort_by(|a, b| (!a.is_built_in, &a.name).cmp(&(!b.is_built_in, &b.name)));
        if let Some(limit) = filter.limit {
            tools.truncate(limit);
        }
        Ok(tools)
    }

    async fn update_tool(&self, id: Uuid, patch: ToolPatch) -> StoreResult<Option<Tool>> {
        let mut state = self.state.write().await;
        let Some(tool) = state.tools.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(tool);
        tool.updated_at = Utc::now();
        Ok(Some(tool.clone()))
    }

    async fn delete_tool(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.tools.remove(&id).is_some())
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn create_workflow(&self, input: NewWorkflow) -> StoreResult<Workflow> {
        let mut state = self.state.write().await;
        state.require_user(input.user_id)?;
        if state.workflow_name_taken(input.user_id, &input.name, None) {
            return Err(StoreError::conflict(format!(
                "workflow named '{}' already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let id = Uuid::now_v7();
        let mut steps: Vec<_> = input.steps.into_iter().map(|s| s.into_step(id)).collect();
        steps.sort_by_key(|s| s.position);

        let workflow = Workflow {
            id,
            user_id: input.user_id,
            name: input.name,
            description: input.description,
            status: input.status,
            config: input.config,
            triggers: input.triggers,
            is_public: input.is_public,
            steps,
            created_at: now,
            updated_at: now,
        };
        state.workflows.insert(id, workflow.clone());
        Ok(workflow)
    }

    async fn get_workflow(&self, id: Uuid) -> StoreResult<Option<Workflow>> {
        let state = self.state.read().await;
        Ok(state.workflows.get(&id).cloned())
    }

    async fn list_workflows(&self, user_id: Uuid) -> StoreResult<Vec<Workflow>> {
        let state = self.state.read().await;
        let mut workflows: Vec<Workflow> = state
            .workflows
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        workflows.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id)));
        Ok(workflows)
    }

    async fn update_workflow(
        &self,
        id: Uuid,
        patch: WorkflowPatch,
    ) -> StoreResult<Option<Workflow>> {
        let mut state = self.state.write().await;
        let Some(user_id) = state.workflows.get(&id).map(|w| w.user_id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            if state.workflow_name_taken(user_id, name, Some(id)) {
                return Err(StoreError::conflict(format!(
                    "workflow named '{}' already exists",
                    name
                )));
            }
        }

        let Some(workflow) = state.workflows.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(workflow);
        workflow.updated_at = Utc::now();
        Ok(Some(workflow.clone()))
    }

    async fn delete_workflow(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.workflows.remove(&id).is_some())
    }
}

// ============================================================================
// MockLlmClient - Returns predefined responses
// ============================================================================

/// A scripted provider response
#[derive(Debug, Clone)]
pub enum MockLlmResponse {
    /// Complete text with optional usage
    Text {
        content: String,
        usage: Option<TokenUsage>,
    },
    /// The provider rejects the call
    Error(LlmError),
    /// Streamed fragments, optionally followed by a failure or by silence
    /// (the stream never ends, as with a stalled provider)
    Stream {
        fragments: Vec<String>,
        fail_with: Option<LlmError>,
        hang: bool,
    },
    /// The provider never answers
    Hang,
}

impl MockLlmResponse {
    /// Text response with fixed usage (10 prompt + 20 completion tokens)
    pub fn text(content: impl Into<String>) -> Self {
        MockLlmResponse::Text {
            content: content.into(),
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        MockLlmResponse::Error(LlmError::with_status(status, message))
    }

    pub fn stream<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        MockLlmResponse::Stream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_with: None,
            hang: false,
        }
    }

    pub fn stream_then_fail<S: Into<String>>(
        fragments: impl IntoIterator<Item = S>,
        error: LlmError,
    ) -> Self {
        MockLlmResponse::Stream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_with: Some(error),
            hang: false,
        }
    }

    pub fn hang() -> Self {
        MockLlmResponse::Hang
    }

    pub fn stream_then_hang<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        MockLlmResponse::Stream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_with: None,
            hang: true,
        }
    }
}

/// Mock LLM client for testing
///
/// Returns queued responses in order, then `"Mock response"` once the
/// queue is empty.
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    responses: Arc<RwLock<VecDeque<MockLlmResponse>>>,
    call_log: Arc<RwLock<Vec<CompletionRequest>>>,
    models: Arc<RwLock<Result<Vec<RemoteModel>, LlmError>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self {
            responses: Arc::new(RwLock::new(VecDeque::new())),
            call_log: Arc::new(RwLock::new(Vec::new())),
            models: Arc::new(RwLock::new(Ok(vec![RemoteModel {
                id: "gpt-4o-mini-2024-07-18".to_string(),
                context_length: Some(128000),
                owned_by: Some("llm7.io".to_string()),
            }]))),
        }
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<MockLlmResponse>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(responses.into())),
            ..Self::default()
        }
    }

    pub async fn push_response(&self, response: MockLlmResponse) {
        self.responses.write().await.push_back(response);
    }

    pub async fn set_models(&self, models: Result<Vec<RemoteModel>, LlmError>) {
        *self.models.write().await = models;
    }

    /// Requests received so far
    pub async fn calls(&self) -> Vec<CompletionRequest> {
        self.call_log.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.call_log.read().await.len()
    }

    async fn next_response(&self, request: CompletionRequest) -> MockLlmResponse {
        self.call_log.write().await.push(request);
        let next = self.responses.write().await.pop_front();
        next.unwrap_or_else(|| {
            tracing::debug!("mock LLM queue empty, using default response");
            MockLlmResponse::text("Mock response")
        })
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat_completion(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let model = request.model.clone();
        match self.next_response(request).await {
            MockLlmResponse::Text { content, usage } => Ok(Completion {
                id: Some(format!("mock-{}", Uuid::now_v7())),
                model,
                content,
                usage,
                finish_reason: Some("stop".to_string()),
            }),
            MockLlmResponse::Error(err) => Err(err),
            MockLlmResponse::Stream {
                fragments,
                fail_with,
                ..
            } => match fail_with {
                Some(err) => Err(err),
                None => Ok(Completion {
                    id: None,
                    model,
                    content: fragments.concat(),
                    usage: None,
                    finish_reason: Some("stop".to_string()),
                }),
            },
            MockLlmResponse::Hang => std::future::pending().await,
        }
    }

    async fn chat_completion_stream(
        &self,
        request: CompletionRequest,
    ) -> Result<TextStream, LlmError> {
        match self.next_response(request).await {
            MockLlmResponse::Text { content, .. } => {
                Ok(Box::pin(stream::iter(vec![Ok(content)])))
            }
            MockLlmResponse::Error(err) => Err(err),
            MockLlmResponse::Stream {
                fragments,
                fail_with,
                hang,
            } => {
                let mut items: Vec<Result<String, LlmError>> =
                    fragments.into_iter().map(Ok).collect();
                if let Some(err) = fail_with {
                    items.push(Err(err));
                }
                let head = stream::iter(items);
                if hang {
                    Ok(Box::pin(head.chain(stream::pending())))
                } else {
                    Ok(Box::pin(head))
                }
            }
            MockLlmResponse::Hang => std::future::pending().await,
        }
    }

    async fn list_models(&self) -> Result<Vec<RemoteModel>, LlmError> {
        self.models.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentStatus;
    use crate::analytics::{AnalyticsType, ExecutionMetrics};
    use crate::tool::ToolType;
    use crate::workflow::{NewWorkflowStep, WorkflowStatus};
    use serde_json::json;

    fn new_agent(user_id: Uuid, name: &str) -> NewAgent {
        NewAgent {
            user_id,
            name: name.to_string(),
            description: None,
            agent_type: Default::default(),
            model: "gpt-4o-mini-2024-07-18".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            system_prompt: None,
            tools: vec![],
            triggers: vec![],
            is_public: false,
        }
    }

    async fn new_user(store: &InMemoryStore, email: &str) -> Uuid {
        store
            .create_user(NewUser {
                email: email.to_string(),
                name: "Test".to_string(),
                avatar: None,
                role: Default::default(),
                password_hash: None,
            })
            .await
            .unwrap()
            .id
    }

    fn new_execution(user_id: Uuid, agent_id: Uuid) -> NewExecution {
        NewExecution {
            user_id,
            agent_id,
            input: json!({"message": "hi"}),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_agent_names_unique_per_user() {
        let store = InMemoryStore::new();
        let alice = new_user(&store, "alice@example.com").await;
        let bob = new_user(&store, "bob@example.com").await;

        let agent = store.create_agent(new_agent(alice, "Helper")).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Inactive);

        let err = store
            .create_agent(new_agent(alice, "Helper"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        store.create_agent(new_agent(bob, "Helper")).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_owner_is_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .create_agent(new_agent(Uuid::now_v7(), "Orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_finish_execution_only_once() {
        let store = InMemoryStore::new();
        let user = new_user(&store, "owner@example.com").await;
        let agent = store.create_agent(new_agent(user, "Helper")).await.unwrap();
        let execution = store
            .create_execution(new_execution(user, agent.id))
            .await
            .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Running);

        let done = store
            .finish_execution(
                execution.id,
                ExecutionOutcome::Succeeded {
                    output: json!({"message": "ok"}),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(done.unwrap().status, ExecutionStatus::Success);

        let second = store
            .finish_execution(
                execution.id,
                ExecutionOutcome::Cancelled {
                    reason: "late".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(second.is_none());

        let stored = store.get_execution(execution.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ExecutionStatus::Success);
    }

    #[tokio::test]
    async fn test_delete_agent_cascades() {
        let store = InMemoryStore::new();
        let user = new_user(&store, "owner@example.com").await;
        let agent = store.create_agent(new_agent(user, "Helper")).await.unwrap();
        let execution = store
            .create_execution(new_execution(user, agent.id))
            .await
            .unwrap();
        store
            .append_log(NewExecutionLog::info(execution.id, "started", json!({})))
            .await
            .unwrap();
        store
            .record_analytics(
                ExecutionMetrics {
                    agent_id: agent.id,
                    user_id: user,
                    total_tokens: 5,
                    ..Default::default()
                }
                .into(),
            )
            .await
            .unwrap();
        let workflow = store
            .create_workflow(NewWorkflow {
                user_id: user,
                name: "Flow".to_string(),
                description: None,
                status: WorkflowStatus::Draft,
                config: json!({}),
                triggers: vec![],
                is_public: false,
                steps: vec![NewWorkflowStep {
                    name: "run".to_string(),
                    step_type: "agent".to_string(),
                    config: json!({}),
                    position: 0,
                    agent_id: Some(agent.id),
                }],
            })
            .await
            .unwrap();

        assert!(store.delete_agent(agent.id).await.unwrap());

        assert!(store.get_execution(execution.id).await.unwrap().is_none());
        assert!(store.list_logs(execution.id).await.unwrap().is_empty());

        let events = store
            .list_analytics(AnalyticsFilter {
                user_id: user,
                analytics_type: Some(AnalyticsType::Execution),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].agent_id, None);
        assert_eq!(store.total_tokens(user).await.unwrap(), 5);

        let workflow = store.get_workflow(workflow.id).await.unwrap().unwrap();
        assert_eq!(workflow.steps[0].agent_id, None);

        assert!(!store.delete_agent(agent.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_tools_sorted_builtin_first() {
        let store = InMemoryStore::new();
        let tool = |name: &str, is_built_in| NewTool {
            name: name.to_string(),
            description: None,
            tool_type: ToolType::Api,
            config: json!({}),
            schema: None,
            is_built_in,
            is_active: true,
        };
        store.create_tool(tool("alpha", false)).await.unwrap();
        store.upsert_builtin_tool(tool("zeta", true)).await.unwrap();
        store.upsert_builtin_tool(tool("zeta", true)).await.unwrap();

        let names: Vec<_> = store
            .list_tools(ToolFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        assert!(store
            .create_tool(tool("alpha", false))
            .await
            .unwrap_err()
            .is_conflict());
    }

    #[tokio::test]
    async fn test_user_email_is_case_insensitive() {
        let store = InMemoryStore::new();
        store
            .create_user(NewUser {
                email: "Ada@Example.com".to_string(),
                name: "Ada".to_string(),
                avatar: None,
                role: Default::default(),
                password_hash: Some("hash".to_string()),
            })
            .await
            .unwrap();

        let creds = store
            .get_user_credentials("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.user.email, "ada@example.com");
        assert_eq!(creds.password_hash.as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn test_mock_llm_replays_in_order() {
        let llm = MockLlmClient::with_responses(vec![
            MockLlmResponse::text("first"),
            MockLlmResponse::error(503, "unavailable"),
        ]);
        let request = CompletionRequest::for_agent("m", None, "hi", 0.7, 10);

        let first = llm.chat_completion(request.clone()).await.unwrap();
        assert_eq!(first.content, "first");
        assert_eq!(first.usage.unwrap().total_tokens, 30);

        let err = llm.chat_completion(request.clone()).await.unwrap_err();
        assert_eq!(err.status, Some(503));

        let fallback = llm.chat_completion(request).await.unwrap();
        assert_eq!(fallback.content, "Mock response");
        assert_eq!(llm.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_mock_llm_stream() {
        let llm = MockLlmClient::with_responses(vec![MockLlmResponse::stream_then_fail(
            ["Hel", "lo"],
            LlmError::new("reset"),
        )]);
        let request = CompletionRequest::for_agent("m", None, "hi", 0.7, 10);

        let items: Vec<_> = llm
            .chat_completion_stream(request)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_deref(), Ok("Hel"));
        assert_eq!(items[1].as_deref(), Ok("lo"));
        assert!(items[2].is_err());
    }

    #[tokio::test]
    async fn test_mock_llm_hang_never_answers() {
        let llm = MockLlmClient::with_responses(vec![MockLlmResponse::hang()]);
        let request = CompletionRequest::for_agent("m", None, "hi", 0.7, 10);

        let waited = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            llm.chat_completion(request),
        )
        .await;
        assert!(waited.is_err());
        assert_eq!(llm.call_count().await, 1);
    }
}
