// Workflow CRUD HTTP routes

use agentdeck_core::{Trigger, Workflow, WorkflowStatus};
use axum::{extract::State, response::Response, routing::get, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::agents::UserQuery;
use super::common::{created, ApiJson, ApiPath, ApiQuery, ApiResponse};
use super::error::ApiResult;
use crate::auth::Requester;
use crate::services::WorkflowService;
use crate::AppState;

/// One step of a workflow definition
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStepInput {
    #[schema(example = "Summarize")]
    pub name: Option<String>,
    /// Free-form step kind
    #[serde(rename = "type")]
    #[schema(example = "agent")]
    pub step_type: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub config: Option<Value>,
    /// Defaults to the index in `steps`
    pub position: Option<i32>,
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    #[schema(example = "Daily digest")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkflowStatus>,
    #[schema(value_type = Option<Object>)]
    pub config: Option<Value>,
    pub triggers: Option<Vec<Trigger>>,
    pub is_public: Option<bool>,
    pub steps: Option<Vec<WorkflowStepInput>>,
    pub user_id: Option<Uuid>,
}

/// Only provided fields are changed; `steps` replaces every step
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkflowRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkflowStatus>,
    #[schema(value_type = Option<Object>)]
    pub config: Option<Value>,
    pub triggers: Option<Vec<Trigger>>,
    pub is_public: Option<bool>,
    pub steps: Option<Vec<WorkflowStepInput>>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowListItem {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub step_count: usize,
}

impl From<Workflow> for WorkflowListItem {
    fn from(workflow: Workflow) -> Self {
        Self {
            step_count: workflow.steps.len(),
            workflow,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workflows", get(list_workflows).post(create_workflow))
        .route(
            "/workflows/:workflow_id",
            get(get_workflow)
                .put(update_workflow)
                .delete(delete_workflow),
        )
}

fn service(state: &AppState) -> WorkflowService {
    WorkflowService::new(state.store.clone())
}

/// GET /workflows - Workflows owned by the requester
#[utoipa::path(
    get,
    path = "/workflows",
    params(("userId" = Option<Uuid>, Query, description = "Owner, when no token is sent")),
    responses(
        (status = 200, description = "Workflows with their steps", body = ApiResponse<Vec<WorkflowListItem>>),
        (status = 400, description = "userId is required", body = super::ErrorBody)
    ),
    tag = "workflows"
)]
pub async fn list_workflows(
    State(state): State<AppState>,
    requester: Requester,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<ApiResponse<Vec<WorkflowListItem>>> {
    let user_id = requester.require(query.user_id)?;
    let workflows = service(&state).list(user_id).await?;
    Ok(ApiResponse::list(
        workflows.into_iter().map(WorkflowListItem::from).collect(),
    ))
}

/// POST /workflows - Create a workflow with its steps
#[utoipa::path(
    post,
    path = "/workflows",
    request_body = CreateWorkflowRequest,
    responses(
        (status = 201, description = "Workflow created", body = ApiResponse<Workflow>),
        (status = 400, description = "Validation failed", body = super::ErrorBody),
        (status = 409, description = "Workflow name already used", body = super::ErrorBody)
    ),
    tag = "workflows"
)]
pub async fn create_workflow(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(req): ApiJson<CreateWorkflowRequest>,
) -> ApiResult<Response> {
    let user_id = requester.require(req.user_id)?;
    let workflow = service(&state).create(user_id, req).await?;
    Ok(created(
        ApiResponse::new(workflow).with_message("Workflow created successfully"),
    ))
}

/// GET /workflows/{workflow_id}
#[utoipa::path(
    get,
    path = "/workflows/{workflow_id}",
    params(
        ("workflow_id" = Uuid, Path, description = "Workflow ID"),
        ("userId" = Option<Uuid>, Query, description = "Requester, when no token is sent")
    ),
    responses(
        (status = 200, description = "Workflow found", body = ApiResponse<Workflow>),
        (status = 404, description = "Workflow not found", body = super::ErrorBody)
    ),
    tag = "workflows"
)]
pub async fn get_workflow(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(workflow_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<ApiResponse<Workflow>> {
    let workflow = service(&state)
        .get(workflow_id, requester.resolve(query.user_id))
        .await?;
    Ok(ApiResponse::new(workflow))
}

/// PUT /workflows/{workflow_id}
#[utoipa::path(
    put,
    path = "/workflows/{workflow_id}",
    params(("workflow_id" = Uuid, Path, description = "Workflow ID")),
    request_body = UpdateWorkflowRequest,
    responses(
        (status = 200, description = "Workflow updated", body = ApiResponse<Workflow>),
        (status = 400, description = "Validation failed", body = super::ErrorBody),
        (status = 404, description = "Workflow not found", body = super::ErrorBody)
    ),
    tag = "workflows"
)]
pub async fn update_workflow(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(workflow_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateWorkflowRequest>,
) -> ApiResult<ApiResponse<Workflow>> {
    let user_id = requester.require(req.user_id)?;
    let workflow = service(&state).update(workflow_id, user_id, req).await?;
    Ok(ApiResponse::new(workflow).with_message("Workflow updated successfully"))
}

/// DELETE /workflows/{workflow_id}
#[utoipa::path(
    delete,
    path = "/workflows/{workflow_id}",
    params(
        ("workflow_id" = Uuid, Path, description = "Workflow ID"),
        ("userId" = Option<Uuid>, Query, description = "Owner, when no token is sent")
    ),
    responses(
        (status = 200, description = "Workflow deleted"),
        (status = 404, description = "Workflow not found", body = super::ErrorBody)
    ),
    tag = "workflows"
)]
pub async fn delete_workflow(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(workflow_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<UserQuery>,
    body: Option<ApiJson<UserQuery>>,
) -> ApiResult<ApiResponse<()>> {
    let claimed = query
        .user_id
        .or_else(|| body.and_then(|ApiJson(b)| b.user_id));
    let user_id = requester.require(claimed)?;
    service(&state).delete(workflow_id, user_id).await?;
    Ok(ApiResponse::new(()).with_message("Workflow deleted successfully"))
}
