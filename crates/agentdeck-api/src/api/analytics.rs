// Dashboard analytics routes

use agentdeck_core::{
    AgentStatus, AnalyticsFilter, AnalyticsType, ErrorType, Execution, ExecutionFilter,
    WorkflowStatus,
};
use axum::{extract::State, routing::get, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::agents::UserQuery;
use super::common::{clamp_limit, ApiQuery, ApiResponse};
use super::error::ApiResult;
use crate::auth::Requester;
use crate::AppState;

const RECENT_EXECUTIONS: usize = 5;
const DEFAULT_ERROR_LIMIT: usize = 20;
const MAX_ERROR_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AgentCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct WorkflowCounts {
    pub total: usize,
    pub active: usize,
    pub draft: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionCounts {
    pub total: i64,
    pub today: i64,
    pub this_week: i64,
    pub success: i64,
    pub failed: i64,
    /// Percent of finished executions that succeeded
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub agents: AgentCounts,
    pub workflows: WorkflowCounts,
    pub executions: ExecutionCounts,
    pub total_tokens: i64,
    pub recent_executions: Vec<Execution>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsQuery {
    pub user_id: Option<Uuid>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub id: Uuid,
    pub agent_id: Option<Uuid>,
    pub error: String,
    pub error_type: Option<ErrorType>,
    pub created_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/dashboard", get(get_dashboard))
        .route("/analytics/errors", get(list_errors))
}

/// GET /analytics/dashboard - Counters for the console home page
#[utoipa::path(
    get,
    path = "/analytics/dashboard",
    params(("userId" = Option<Uuid>, Query, description = "Requester, when no token is sent")),
    responses(
        (status = 200, description = "Dashboard counters", body = ApiResponse<Dashboard>),
        (status = 400, description = "userId is required", body = super::ErrorBody)
    ),
    tag = "analytics"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<ApiResponse<Dashboard>> {
    let user_id = requester.require(query.user_id)?;
    let store = &state.store;

    let agents = store.list_agents(user_id).await?;
    let agent_counts = AgentCounts {
        total: agents.len(),
        active: agents
            .iter()
            .filter(|a| a.agent.status == AgentStatus::Active)
            .count(),
        inactive: agents
            .iter()
            .filter(|a| a.agent.status == AgentStatus::Inactive)
            .count(),
    };

    let workflows = store.list_workflows(user_id).await?;
    let workflow_counts = WorkflowCounts {
        total: workflows.len(),
        active: workflows
            .iter()
            .filter(|w| w.status == WorkflowStatus::Active)
            .count(),
        draft: workflows
            .iter()
            .filter(|w| w.status == WorkflowStatus::Draft)
            .count(),
    };

    let now = Utc::now();
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);
    let stats = store
        .execution_stats(user_id, today_start, now - Duration::days(7))
        .await?;

    let recent_executions = store
        .list_executions(ExecutionFilter {
            limit: RECENT_EXECUTIONS,
            ..ExecutionFilter::for_user(user_id)
        })
        .await?;

    Ok(ApiResponse::new(Dashboard {
        agents: agent_counts,
        workflows: workflow_counts,
        executions: ExecutionCounts {
            total: stats.total,
            today: stats.today,
            this_week: stats.this_week,
            success: stats.success,
            failed: stats.failed,
            success_rate: stats.success_rate(),
        },
        total_tokens: store.total_tokens(user_id).await?,
        recent_executions,
    }))
}

/// GET /analytics/errors - Most recent execution errors
#[utoipa::path(
    get,
    path = "/analytics/errors",
    params(
        ("userId" = Option<Uuid>, Query, description = "Requester, when no token is sent"),
        ("limit" = Option<usize>, Query, description = "Page size (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Errors, newest first", body = ApiResponse<Vec<ErrorEntry>>),
        (status = 400, description = "userId is required", body = super::ErrorBody)
    ),
    tag = "analytics"
)]
pub async fn list_errors(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<ErrorsQuery>,
) -> ApiResult<ApiResponse<Vec<ErrorEntry>>> {
    let user_id = requester.require(query.user_id)?;
    let events = state
        .store
        .list_analytics(AnalyticsFilter {
            user_id,
            analytics_type: Some(AnalyticsType::Error),
            limit: Some(clamp_limit(query.limit, DEFAULT_ERROR_LIMIT, MAX_ERROR_LIMIT)),
        })
        .await?;

    let errors = events
        .into_iter()
        .map(|event| ErrorEntry {
            id: event.id,
            agent_id: event.agent_id,
            error: event
                .data
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            error_type: event
                .data
                .get("errorType")
                .cloned()
                .and_then(|t| serde_json::from_value(t).ok()),
            created_at: event.created_at,
        })
        .collect();

    Ok(ApiResponse::list(errors))
}
