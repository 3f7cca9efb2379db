// Database rows (internal, converted into core domain types)

use agentdeck_core::{
    Agent, AgentListItem, Analytics, Execution, ExecutionLog, StoreError, StoreResult, Tool,
    Trigger, User, UserCredentials, Workflow, WorkflowStep,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Decode an upper-case TEXT column into its enum
pub(crate) fn parse_enum<T: DeserializeOwned>(column: &str, value: &str) -> StoreResult<T> {
    serde_json::from_value(Value::String(value.to_string())).map_err(|_| {
        StoreError::Serialization(format!("unexpected {} value '{}'", column, value))
    })
}

fn parse_triggers(value: Value) -> StoreResult<Vec<Trigger>> {
    Ok(serde_json::from_value(value)?)
}

// ============================================
// Users
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserCredentials {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(UserCredentials {
            user: User {
                id: row.id,
                email: row.email,
                name: row.name,
                avatar: row.avatar,
                role: parse_enum("role", &row.role)?,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        })
    }
}

// ============================================
// Agents
// ============================================

pub(crate) const AGENT_COLUMNS: &str = "id, user_id, name, description, agent_type, status, \
     model, temperature, max_tokens, system_prompt, tools, triggers, is_public, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct AgentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub agent_type: String,
    pub status: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i32,
    pub system_prompt: Option<String>,
    pub tools: Vec<String>,
    pub triggers: Value,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = StoreError;

    fn try_from(row: AgentRow) -> StoreResult<Self> {
        Ok(Agent {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            agent_type: parse_enum("agent_type", &row.agent_type)?,
            status: parse_enum("status", &row.status)?,
            model: row.model,
            temperature: row.temperature,
            max_tokens: u32::try_from(row.max_tokens).unwrap_or_default(),
            system_prompt: row.system_prompt,
            tools: row.tools,
            triggers: parse_triggers(row.triggers)?,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AgentWithCountRow {
    #[sqlx(flatten)]
    pub agent: AgentRow,
    pub execution_count: i64,
}

impl TryFrom<AgentWithCountRow> for AgentListItem {
    type Error = StoreError;

    fn try_from(row: AgentWithCountRow) -> StoreResult<Self> {
        Ok(AgentListItem {
            agent: row.agent.try_into()?,
            execution_count: row.execution_count,
        })
    }
}

// ============================================
// Executions and logs
// ============================================

pub(crate) const EXECUTION_COLUMNS: &str = "id, execution_type, status, input, output, error, \
     started_at, finished_at, duration, user_id, agent_id";

#[derive(Debug, Clone, FromRow)]
pub struct ExecutionRow {
    pub id: Uuid,
    pub execution_type: String,
    pub status: String,
    pub input: Value,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub user_id: Uuid,
    pub agent_id: Uuid,
}

impl TryFrom<ExecutionRow> for Execution {
    type Error = StoreError;

    fn try_from(row: ExecutionRow) -> StoreResult<Self> {
        Ok(Execution {
            id: row.id,
            execution_type: parse_enum("execution_type", &row.execution_type)?,
            status: parse_enum("status", &row.status)?,
            input: row.input,
            output: row.output,
            error: row.error,
            started_at: row.started_at,
            finished_at: row.finished_at,
            duration: row.duration,
            user_id: row.user_id,
            agent_id: row.agent_id,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExecutionLogRow {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub level: String,
    pub message: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ExecutionLogRow> for ExecutionLog {
    type Error = StoreError;

    fn try_from(row: ExecutionLogRow) -> StoreResult<Self> {
        Ok(ExecutionLog {
            id: row.id,
            execution_id: row.execution_id,
            level: parse_enum("level", &row.level)?,
            message: row.message,
            data: row.data,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExecutionStatsRow {
    pub total: i64,
    pub today: i64,
    pub this_week: i64,
    pub success: i64,
    pub failed: i64,
    pub running: i64,
    pub cancelled: i64,
}

// ============================================
// Analytics
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AnalyticsRow {
    pub id: Uuid,
    pub analytics_type: String,
    pub data: Value,
    pub user_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AnalyticsRow> for Analytics {
    type Error = StoreError;

    fn try_from(row: AnalyticsRow) -> StoreResult<Self> {
        Ok(Analytics {
            id: row.id,
            analytics_type: parse_enum("analytics_type", &row.analytics_type)?,
            data: row.data,
            user_id: row.user_id,
            agent_id: row.agent_id,
            created_at: row.created_at,
        })
    }
}

// ============================================
// Tools
// ============================================

pub(crate) const TOOL_COLUMNS: &str = "id, name, description, tool_type, config, schema, \
     is_built_in, is_active, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct ToolRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub tool_type: String,
    pub config: Value,
    pub schema: Option<Value>,
    pub is_built_in: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ToolRow> for Tool {
    type Error = StoreError;

    fn try_from(row: ToolRow) -> StoreResult<Self> {
        Ok(Tool {
            id: row.id,
            name: row.name,
            description: row.description,
            tool_type: parse_enum("tool_type", &row.tool_type)?,
            config: row.config,
            schema: row.schema,
            is_built_in: row.is_built_in,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================
// Workflows
// ============================================

pub(crate) const WORKFLOW_COLUMNS: &str = "id, user_id, name, description, status, config, \
     triggers, is_public, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub config: Value,
    pub triggers: Value,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRow {
    /// Attach already ordered steps
    pub fn into_workflow(self, steps: Vec<WorkflowStep>) -> StoreResult<Workflow> {
        Ok(Workflow {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            status: parse_enum("status", &self.status)?,
            config: self.config,
            triggers: parse_triggers(self.triggers)?,
            is_public: self.is_public,
            steps,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkflowStepRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub name: String,
    pub step_type: String,
    pub config: Value,
    pub position: i32,
    pub agent_id: Option<Uuid>,
}

impl From<WorkflowStepRow> for WorkflowStep {
    fn from(row: WorkflowStepRow) -> Self {
        WorkflowStep {
            id: row.id,
            workflow_id: row.workflow_id,
            name: row.name,
            step_type: row.step_type,
            config: row.config,
            position: row.position,
            agent_id: row.agent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdeck_core::{AgentStatus, ExecutionStatus};
    use serde_json::json;

    #[test]
    fn test_parse_enum() {
        let status: AgentStatus = parse_enum("status", "ACTIVE").unwrap();
        assert_eq!(status, AgentStatus::Active);

        let err = parse_enum::<ExecutionStatus>("status", "DONE").unwrap_err();
        assert!(err.to_string().contains("DONE"));
    }

    #[test]
    fn test_agent_row_conversion() {
        let now = Utc::now();
        let row = AgentRow {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            name: "Helper".to_string(),
            description: None,
            agent_type: "DATA_PROCESSOR".to_string(),
            status: "PAUSED".to_string(),
            model: "mistral-medium".to_string(),
            temperature: 1.5,
            max_tokens: 256,
            system_prompt: Some("be terse".to_string()),
            tools: vec!["github".to_string()],
            triggers: json!([{"type": "manual"}]),
            is_public: true,
            created_at: now,
            updated_at: now,
        };

        let agent = Agent::try_from(row).unwrap();
        assert_eq!(agent.status, AgentStatus::Paused);
        assert_eq!(agent.max_tokens, 256);
        assert_eq!(agent.triggers, vec![Trigger::Manual]);
    }
}
