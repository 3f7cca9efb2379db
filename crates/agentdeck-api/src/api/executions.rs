// Agent execution HTTP routes
// Decision: One execute endpoint; `stream: true` switches the response to server-sent events
// Decision: Stream events are JSON objects tagged by `type` (chunk, complete, error)

use agentdeck_core::{Execution, ExecutionLog, ExecutionStatus, TokenUsage};
use axum::{
    extract::State,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use utoipa::ToSchema;
use uuid::Uuid;

use super::agents::UserQuery;
use super::common::{clamp_limit, ApiJson, ApiPath, ApiQuery, ApiResponse};
use super::error::{ApiError, ApiResult};
use super::validation::{Validator, MAX_EXECUTION_INPUT_BYTES};
use crate::auth::Requester;
use crate::services::ExecutionService;
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 200;

/// Request to execute an agent
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Text sent to the agent as the user message
    #[schema(example = "hello")]
    pub input: Option<String>,
    /// Requester, when no token is sent
    pub user_id: Option<Uuid>,
    /// Relay the completion as server-sent events
    #[serde(default)]
    pub stream: bool,
}

/// Result of a synchronous execution
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub execution_id: Uuid,
    pub output: String,
    pub usage: Option<TokenUsage>,
    /// Milliseconds
    pub duration: i64,
    pub model: String,
}

/// One server-sent event of a streamed execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// A fragment of the completion and everything received so far
    Chunk { content: String, accumulated: String },
    /// The upstream finished; the execution is persisted as SUCCESS
    #[serde(rename_all = "camelCase")]
    Complete {
        execution_id: Uuid,
        duration: i64,
        full_content: String,
    },
    /// The execution failed; no further events follow
    #[serde(rename_all = "camelCase")]
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution_id: Option<Uuid>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub status: Option<ExecutionStatus>,
    pub limit: Option<usize>,
}

/// Execution with its ordered logs
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetail {
    #[serde(flatten)]
    pub execution: Execution,
    pub logs: Vec<ExecutionLog>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agents/:agent_id/execute", post(execute_agent))
        .route("/executions", get(list_executions))
        .route("/executions/:execution_id", get(get_execution))
}

fn service(state: &AppState) -> ExecutionService {
    ExecutionService::new(state.store.clone(), state.llm.clone())
}

/// POST /agents/{agent_id}/execute - Run an agent once
#[utoipa::path(
    post,
    path = "/agents/{agent_id}/execute",
    params(("agent_id" = Uuid, Path, description = "Agent ID")),
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "Execution result, or an event stream when `stream` is set", body = ApiResponse<ExecutionResult>),
        (status = 400, description = "Missing input or agent not active", body = super::ErrorBody),
        (status = 404, description = "Agent not found", body = super::ErrorBody),
        (status = 502, description = "LLM provider failed", body = super::ErrorBody)
    ),
    tag = "executions"
)]
pub async fn execute_agent(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(agent_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ExecuteRequest>,
) -> ApiResult<Response> {
    let input = req
        .input
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("input is required"))?;
    Validator::new()
        .max_bytes("input", Some(&input), MAX_EXECUTION_INPUT_BYTES)
        .finish()?;
    let user_id = requester.require(req.user_id)?;

    let service = service(&state);
    let agent = service.runnable_agent(agent_id, user_id).await?;

    if !req.stream {
        let result = service.execute(&agent, user_id, input).await?;
        return Ok(ApiResponse::new(result)
            .with_message("Agent executed successfully")
            .into_response());
    }

    let events = service.execute_stream(agent, user_id, input).await?;
    let body = ReceiverStream::new(events).map(|event| Event::default().json_data(event));
    Ok(Sse::new(body).into_response())
}

/// GET /executions - Execution history of the requester
#[utoipa::path(
    get,
    path = "/executions",
    params(
        ("userId" = Option<Uuid>, Query, description = "Requester, when no token is sent"),
        ("agentId" = Option<Uuid>, Query, description = "Only this agent"),
        ("status" = Option<ExecutionStatus>, Query, description = "Only this status"),
        ("limit" = Option<usize>, Query, description = "Page size (default 50, max 200)")
    ),
    responses(
        (status = 200, description = "Executions, newest first", body = ApiResponse<Vec<Execution>>),
        (status = 400, description = "userId is required", body = super::ErrorBody)
    ),
    tag = "executions"
)]
pub async fn list_executions(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<ApiResponse<Vec<Execution>>> {
    let user_id = requester.require(query.user_id)?;
    let limit = clamp_limit(query.limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
    let executions = service(&state)
        .history(user_id, query.agent_id, query.status, limit)
        .await?;
    Ok(ApiResponse::list(executions))
}

/// GET /executions/{execution_id} - One execution with its logs
#[utoipa::path(
    get,
    path = "/executions/{execution_id}",
    params(
        ("execution_id" = Uuid, Path, description = "Execution ID"),
        ("userId" = Option<Uuid>, Query, description = "Requester, when no token is sent")
    ),
    responses(
        (status = 200, description = "Execution found", body = ApiResponse<ExecutionDetail>),
        (status = 404, description = "Execution not found", body = super::ErrorBody)
    ),
    tag = "executions"
)]
pub async fn get_execution(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(execution_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<ApiResponse<ExecutionDetail>> {
    let user_id = requester.require(query.user_id)?;
    let detail = service(&state).detail(execution_id, user_id).await?;
    Ok(ApiResponse::new(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stream_event_wire_format() {
        let id = Uuid::now_v7();
        let chunk = StreamEvent::Chunk {
            content: "lo".to_string(),
            accumulated: "hello".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({"type": "chunk", "content": "lo", "accumulated": "hello"})
        );

        let complete = StreamEvent::Complete {
            execution_id: id,
            duration: 12,
            full_content: "hello".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&complete).unwrap(),
            json!({"type": "complete", "executionId": id, "duration": 12, "fullContent": "hello"})
        );

        let error = StreamEvent::Error {
            error: "boom".to_string(),
            execution_id: None,
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"type": "error", "error": "boom"})
        );
    }

    #[test]
    fn test_execute_request_defaults_to_sync() {
        let req: ExecuteRequest = serde_json::from_value(json!({"input": "hi"})).unwrap();
        assert!(!req.stream);
        assert!(req.user_id.is_none());
    }
}
