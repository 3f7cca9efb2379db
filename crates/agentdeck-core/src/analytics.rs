// Analytics events
//
// Append-only records written by the execution handler. EXECUTION events carry
// token usage, ERROR events carry a classification of what went wrong.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsType {
    Execution,
    Error,
}

impl AnalyticsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsType::Execution => "EXECUTION",
            AnalyticsType::Error => "ERROR",
        }
    }
}

/// Classification stored in ERROR events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// The provider call failed
    LlmError,
    /// Anything else that broke after the execution row existed
    SystemError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub analytics_type: AnalyticsType,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: Value,
    pub user_id: Uuid,
    /// Cleared when the agent is deleted
    pub agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Analytics {
    /// `totalTokens` of an EXECUTION event, 0 for anything else
    pub fn total_tokens(&self) -> i64 {
        if self.analytics_type != AnalyticsType::Execution {
            return 0;
        }
        self.data
            .get("totalTokens")
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct NewAnalytics {
    pub analytics_type: AnalyticsType,
    pub data: Value,
    pub user_id: Uuid,
    pub agent_id: Option<Uuid>,
}

/// Payload of an EXECUTION event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub agent_id: Uuid,
    pub user_id: Uuid,
    pub model: String,
    pub duration: i64,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    /// Characters produced by a streamed execution, where no usage is reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_length: Option<usize>,
}

impl From<ExecutionMetrics> for NewAnalytics {
    fn from(metrics: ExecutionMetrics) -> Self {
        NewAnalytics {
            analytics_type: AnalyticsType::Execution,
            user_id: metrics.user_id,
            agent_id: Some(metrics.agent_id),
            data: serde_json::to_value(&metrics).unwrap_or(Value::Null),
        }
    }
}

/// Payload of an ERROR event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub agent_id: Uuid,
    pub user_id: Uuid,
    pub error: String,
    pub error_type: ErrorType,
}

impl From<ErrorReport> for NewAnalytics {
    fn from(report: ErrorReport) -> Self {
        NewAnalytics {
            analytics_type: AnalyticsType::Error,
            user_id: report.user_id,
            agent_id: Some(report.agent_id),
            data: serde_json::to_value(&report).unwrap_or(Value::Null),
        }
    }
}

/// Filter for analytics queries, newest first
#[derive(Debug, Clone)]
pub struct AnalyticsFilter {
    pub user_id: Uuid,
    pub analytics_type: Option<AnalyticsType>,
    pub limit: Option<usize>,
}

impl AnalyticsFilter {
    pub fn matches(&self, event: &Analytics) -> bool {
        event.user_id == self.user_id
            && self
                .analytics_type
                .map_or(true, |t| event.analytics_type == t)
    }
}
