// Store traits for pluggable persistence backends
//
// - Postgres implementations in agentdeck-storage for production
// - InMemoryStore in memory.rs for tests and examples
//
// "Not found" is Ok(None) / Ok(false); uniqueness violations are
// StoreError::Conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::agent::{Agent, AgentListItem, AgentPatch, NewAgent};
use crate::analytics::{Analytics, AnalyticsFilter, NewAnalytics};
use crate::error::StoreResult;
use crate::execution::{
    Execution, ExecutionFilter, ExecutionLog, ExecutionOutcome, ExecutionStats, NewExecution,
    NewExecutionLog,
};
use crate::tool::{NewTool, Tool, ToolFilter, ToolPatch};
use crate::user::{NewUser, User, UserCredentials};
use crate::workflow::{NewWorkflow, Workflow, WorkflowPatch};

// ============================================================================
// UserStore
// ============================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user; the email must be unique (case-insensitive)
    async fn create_user(&self, input: NewUser) -> StoreResult<User>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Look up a user with the stored password hash, for login
    async fn get_user_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>>;
}

// ============================================================================
// AgentStore
// ============================================================================

#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Create an agent; (user_id, name) must be unique
    async fn create_agent(&self, input: NewAgent) -> StoreResult<Agent>;

    async fn get_agent(&self, id: Uuid) -> StoreResult<Option<Agent>>;

    /// Agents owned by a user, most recently updated first
    async fn list_agents(&self, user_id: Uuid) -> StoreResult<Vec<AgentListItem>>;

    async fn update_agent(&self, id: Uuid, patch: AgentPatch) -> StoreResult<Option<Agent>>;

    /// Delete an agent with its executions and their logs.
    /// Analytics rows and workflow steps keep existing with the agent cleared.
    async fn delete_agent(&self, id: Uuid) -> StoreResult<bool>;
}

// ============================================================================
// ExecutionStore
// ============================================================================

#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a RUNNING execution
    async fn create_execution(&self, input: NewExecution) -> StoreResult<Execution>;

    /// Apply the single terminal transition.
    ///
    /// Returns None when the execution does not exist or already left RUNNING;
    /// the stored row is not modified in that case.
    async fn finish_execution(
        &self,
        id: Uuid,
        outcome: ExecutionOutcome,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<Option<Execution>>;

    async fn get_execution(&self, id: Uuid) -> StoreResult<Option<Execution>>;

    /// Newest first, at most `filter.limit`
    async fn list_executions(&self, filter: ExecutionFilter) -> StoreResult<Vec<Execution>>;

    async fn count_executions(&self, agent_id: Uuid) -> StoreResult<i64>;

    /// Counts over a user's executions; `today` and `this_week` count rows
    /// started at or after the given instants
    async fn execution_stats(
        &self,
        user_id: Uuid,
        today_start: DateTime<Utc>,
        week_start: DateTime<Utc>,
    ) -> StoreResult<ExecutionStats>;

    async fn append_log(&self, input: NewExecutionLog) -> StoreResult<ExecutionLog>;

    /// Logs of an execution in insertion order
    async fn list_logs(&self, execution_id: Uuid) -> StoreResult<Vec<ExecutionLog>>;
}

// ============================================================================
// AnalyticsStore
// ============================================================================

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn record_analytics(&self, input: NewAnalytics) -> StoreResult<Analytics>;

    /// Newest first
    async fn list_analytics(&self, filter: AnalyticsFilter) -> StoreResult<Vec<Analytics>>;

    /// Sum of `totalTokens` over a user's EXECUTION events
    async fn total_tokens(&self, user_id: Uuid) -> StoreResult<i64>;
}

// ============================================================================
// ToolStore
// ============================================================================

#[async_trait]
pub trait ToolStore: Send + Sync {
    /// Create a tool; the (normalized) name must be unique
    async fn create_tool(&self, input: NewTool) -> StoreResult<Tool>;

    /// Insert or refresh a built-in tool keyed by name
    async fn upsert_builtin_tool(&self, input: NewTool) -> StoreResult<Tool>;

    async fn get_tool(&self, id: Uuid) -> StoreResult<Option<Tool>>;

    /// Built-in tools first, then by name
    async fn list_tools(&self, filter: ToolFilter) -> StoreResult<Vec<Tool>>;

    async fn update_tool(&self, id: Uuid, patch: ToolPatch) -> StoreResult<Option<Tool>>;

    async fn delete_tool(&self, id: Uuid) -> StoreResult<bool>;
}

// ============================================================================
// WorkflowStore
// ============================================================================

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Create a workflow and its steps atomically; (user_id, name) must be unique
    async fn create_workflow(&self, input: NewWorkflow) -> StoreResult<Workflow>;

    async fn get_workflow(&self, id: Uuid) -> StoreResult<Option<Workflow>>;

    /// Workflows owned by a user, most recently updated first
    async fn list_workflows(&self, user_id: Uuid) -> StoreResult<Vec<Workflow>>;

    async fn update_workflow(
        &self,
        id: Uuid,
        patch: WorkflowPatch,
    ) -> StoreResult<Option<Workflow>>;

    /// Delete a workflow with its steps
    async fn delete_workflow(&self, id: Uuid) -> StoreResult<bool>;
}

// ============================================================================
// Store - everything the API needs behind one object
// ============================================================================

pub trait Store:
    UserStore + AgentStore + ExecutionStore + AnalyticsStore + ToolStore + WorkflowStore
{
}

impl<T> Store for T where
    T: UserStore + AgentStore + ExecutionStore + AnalyticsStore + ToolStore + WorkflowStore
{
}
