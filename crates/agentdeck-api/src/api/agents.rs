// Agent CRUD HTTP routes

use agentdeck_core::{Agent, AgentListItem, AgentStatus, AgentType, Execution, Trigger};
use axum::{
    extract::State,
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{created, ApiJson, ApiPath, ApiQuery, ApiResponse};
use super::error::ApiResult;
use crate::auth::Requester;
use crate::services::AgentService;
use crate::AppState;

/// Request to create a new agent
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    /// Display name, unique per owner
    #[schema(example = "Support Bot")]
    pub name: Option<String>,
    #[schema(example = "Answers product questions")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: Option<AgentType>,
    #[schema(example = "gpt-4o-mini-2024-07-18")]
    pub model: Option<String>,
    #[schema(example = 0.7)]
    pub temperature: Option<f64>,
    #[schema(example = 1000)]
    pub max_tokens: Option<i64>,
    #[schema(example = "You are a helpful assistant.")]
    pub system_prompt: Option<String>,
    /// Tool names, in order
    pub tools: Option<Vec<String>>,
    pub triggers: Option<Vec<Trigger>>,
    pub is_public: Option<bool>,
    /// Owner; ignored when a bearer token is presented
    pub user_id: Option<Uuid>,
}

/// Request to update an agent. Only provided fields are changed.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub agent_type: Option<AgentType>,
    pub status: Option<AgentStatus>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub system_prompt: Option<String>,
    pub tools: Option<Vec<String>>,
    pub triggers: Option<Vec<Trigger>>,
    pub is_public: Option<bool>,
    pub user_id: Option<Uuid>,
}

/// `userId` for requests without a bearer token
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<Uuid>,
}

/// Agent with its execution count and most recent executions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentDetail {
    #[serde(flatten)]
    pub agent: Agent,
    pub execution_count: i64,
    /// Newest first, at most 10
    pub recent_executions: Vec<Execution>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agents", get(list_agents).post(create_agent))
        .route(
            "/agents/:agent_id",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
}

fn service(state: &AppState) -> AgentService {
    AgentService::new(state.store.clone())
}

/// GET /agents - Agents owned by the requester
#[utoipa::path(
    get,
    path = "/agents",
    params(("userId" = Option<Uuid>, Query, description = "Owner, when no token is sent")),
    responses(
        (status = 200, description = "Agents of the requester", body = ApiResponse<Vec<AgentListItem>>),
        (status = 400, description = "userId is required", body = super::ErrorBody)
    ),
    tag = "agents"
)]
pub async fn list_agents(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<ApiResponse<Vec<AgentListItem>>> {
    let user_id = requester.require(query.user_id)?;
    let agents = service(&state).list(user_id).await?;
    Ok(ApiResponse::list(agents))
}

/// POST /agents - Create a new agent in INACTIVE status
#[utoipa::path(
    post,
    path = "/agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created", body = ApiResponse<Agent>),
        (status = 400, description = "Validation failed", body = super::ErrorBody),
        (status = 409, description = "Agent name already used", body = super::ErrorBody)
    ),
    tag = "agents"
)]
pub async fn create_agent(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(req): ApiJson<CreateAgentRequest>,
) -> ApiResult<Response> {
    let user_id = requester.require(req.user_id)?;
    let agent = service(&state).create(user_id, req).await?;
    Ok(created(
        ApiResponse::new(agent).with_message("Agent created successfully"),
    ))
}

/// GET /agents/{agent_id} - Agent with recent executions
#[utoipa::path(
    get,
    path = "/agents/{agent_id}",
    params(
        ("agent_id" = Uuid, Path, description = "Agent ID"),
        ("userId" = Option<Uuid>, Query, description = "Requester, when no token is sent")
    ),
    responses(
        (status = 200, description = "Agent found", body = ApiResponse<AgentDetail>),
        (status = 404, description = "Agent not found", body = super::ErrorBody)
    ),
    tag = "agents"
)]
pub async fn get_agent(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(agent_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<ApiResponse<AgentDetail>> {
    let detail = service(&state)
        .get(agent_id, requester.resolve(query.user_id))
        .await?;
    Ok(ApiResponse::new(detail))
}

/// PUT /agents/{agent_id} - Update whitelisted agent fields
#[utoipa::path(
    put,
    path = "/agents/{agent_id}",
    params(("agent_id" = Uuid, Path, description = "Agent ID")),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Agent updated", body = ApiResponse<Agent>),
        (status = 400, description = "Validation failed", body = super::ErrorBody),
        (status = 404, description = "Agent not found", body = super::ErrorBody),
        (status = 409, description = "Agent name already used", body = super::ErrorBody)
    ),
    tag = "agents"
)]
pub async fn update_agent(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(agent_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateAgentRequest>,
) -> ApiResult<ApiResponse<Agent>> {
    let user_id = requester.require(req.user_id)?;
    let agent = service(&state).update(agent_id, user_id, req).await?;
    Ok(ApiResponse::new(agent).with_message("Agent updated successfully"))
}

/// DELETE /agents/{agent_id} - Delete an agent and its executions
#[utoipa::path(
    delete,
    path = "/agents/{agent_id}",
    params(
        ("agent_id" = Uuid, Path, description = "Agent ID"),
        ("userId" = Option<Uuid>, Query, description = "Owner, when no token is sent")
    ),
    responses(
        (status = 200, description = "Agent deleted"),
        (status = 404, description = "Agent not found", body = super::ErrorBody)
    ),
    tag = "agents"
)]
pub async fn delete_agent(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(agent_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<UserQuery>,
    body: Option<ApiJson<UserQuery>>,
) -> ApiResult<ApiResponse<()>> {
    let claimed = query
        .user_id
        .or_else(|| body.and_then(|ApiJson(b)| b.user_id));
    let user_id = requester.require(claimed)?;
    service(&state).delete(agent_id, user_id).await?;
    Ok(ApiResponse::new(()).with_message("Agent deleted successfully"))
}
