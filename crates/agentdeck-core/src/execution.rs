// Execution domain types
//
// An execution is one recorded invocation of an agent. It is created in
// RUNNING and receives exactly one terminal update; stores refuse to touch a
// row that already left RUNNING.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// What was executed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    #[default]
    Agent,
}

impl ExecutionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionType::Agent => "AGENT",
        }
    }
}

/// Execution lifecycle status.
///
/// RUNNING is the only non-terminal state. CANCELLED is reached when the
/// client of a streamed execution goes away before the upstream finishes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub execution_type: ExecutionType,
    pub status: ExecutionStatus,
    /// `{"message": <input text>}`
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub input: Value,
    /// `{"message": <output text>, "usage"?: .., "model"?: ..}` once successful
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Milliseconds between `started_at` and `finished_at`
    pub duration: Option<i64>,
    pub user_id: Uuid,
    pub agent_id: Uuid,
}

impl Execution {
    /// Build the RUNNING row for a new execution
    pub fn start(id: Uuid, input: NewExecution) -> Self {
        Self {
            id,
            execution_type: ExecutionType::Agent,
            status: ExecutionStatus::Running,
            input: input.input,
            output: None,
            error: None,
            started_at: input.started_at,
            finished_at: None,
            duration: None,
            user_id: input.user_id,
            agent_id: input.agent_id,
        }
    }

    /// Apply the terminal transition. Returns false (and changes nothing) if
    /// the execution is no longer running.
    pub fn finish(&mut self, outcome: ExecutionOutcome, finished_at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.status = outcome.status();
        match outcome {
            ExecutionOutcome::Succeeded { output } => self.output = Some(output),
            ExecutionOutcome::Failed { error } | ExecutionOutcome::Cancelled { reason: error } => {
                self.error = Some(error)
            }
        }
        self.finished_at = Some(finished_at);
        self.duration = Some((finished_at - self.started_at).num_milliseconds());
        true
    }

    /// Output text of a successful execution
    pub fn output_message(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|o| o.get("message"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct NewExecution {
    pub user_id: Uuid,
    pub agent_id: Uuid,
    pub input: Value,
    pub started_at: DateTime<Utc>,
}

/// Terminal transition of an execution
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Succeeded { output: Value },
    Failed { error: String },
    Cancelled { reason: String },
}

impl ExecutionOutcome {
    pub fn status(&self) -> ExecutionStatus {
        match self {
            ExecutionOutcome::Succeeded { .. } => ExecutionStatus::Success,
            ExecutionOutcome::Failed { .. } => ExecutionStatus::Failed,
            ExecutionOutcome::Cancelled { .. } => ExecutionStatus::Cancelled,
        }
    }
}

/// Filter for execution history queries
#[derive(Debug, Clone)]
pub struct ExecutionFilter {
    /// None lists executions of every user (agent detail pages)
    pub user_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub status: Option<ExecutionStatus>,
    pub limit: usize,
}

impl ExecutionFilter {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            agent_id: None,
            status: None,
            limit: 50,
        }
    }

    /// Most recent executions of one agent, whoever ran them
    pub fn for_agent(agent_id: Uuid, limit: usize) -> Self {
        Self {
            user_id: None,
            agent_id: Some(agent_id),
            status: None,
            limit,
        }
    }

    pub fn matches(&self, execution: &Execution) -> bool {
        self.user_id.map_or(true, |id| execution.user_id == id)
            && self.agent_id.map_or(true, |id| execution.agent_id == id)
            && self.status.map_or(true, |s| execution.status == s)
    }
}

/// Aggregated execution counts for the dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub total: i64,
    pub today: i64,
    pub this_week: i64,
    pub success: i64,
    pub failed: i64,
    pub running: i64,
    pub cancelled: i64,
}

impl ExecutionStats {
    /// Percentage of finished executions that succeeded, 0 when none finished
    pub fn success_rate(&self) -> f64 {
        let finished = self.success + self.failed + self.cancelled;
        if finished == 0 {
            return 0.0;
        }
        (self.success as f64 * 100.0 / finished as f64).round()
    }
}

// ============================================
// Execution logs
// ============================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Append-only log line attached to an execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLog {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub level: LogLevel,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExecutionLog {
    pub execution_id: Uuid,
    pub level: LogLevel,
    pub message: String,
    pub data: Value,
}

impl NewExecutionLog {
    pub fn info(execution_id: Uuid, message: impl Into<String>, data: Value) -> Self {
        Self {
            execution_id,
            level: LogLevel::Info,
            message: message.into(),
            data,
        }
    }

    pub fn warn(execution_id: Uuid, message: impl Into<String>, data: Value) -> Self {
        Self {
            execution_id,
            level: LogLevel::Warn,
            message: message.into(),
            data,
        }
    }

    pub fn error(execution_id: Uuid, message: impl Into<String>, data: Value) -> Self {
        Self {
            execution_id,
            level: LogLevel::Error,
            message: message.into(),
            data,
        }
    }
}
