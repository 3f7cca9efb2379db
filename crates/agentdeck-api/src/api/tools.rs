// Tool registry HTTP routes
// Decision: `GET /tools?action=categories|popular` answers the catalog views on the list route
// Decision: Tools are shared by all users; the requester only gates access in full auth mode

use agentdeck_core::{Tool, ToolType};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{created, ApiJson, ApiPath, ApiQuery, ApiResponse};
use super::error::{ApiError, ApiResult};
use crate::auth::Requester;
use crate::services::ToolService;
use crate::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolQuery {
    /// `categories` or `popular`; absent for the plain list
    pub action: Option<String>,
    /// Tool type, case-insensitive
    pub category: Option<String>,
    pub is_built_in: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateToolRequest {
    #[schema(example = "weather")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tool_type: Option<ToolType>,
    #[schema(value_type = Option<Object>)]
    pub config: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToolRequest {
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tool_type: Option<ToolType>,
    #[schema(value_type = Option<Object>)]
    pub config: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub schema: Option<Value>,
    pub is_active: Option<bool>,
}

/// Catalog category with the number of active tools of that type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolCategory {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub examples: Vec<String>,
    pub count: usize,
}

impl ToolCategory {
    pub fn new(tool_type: ToolType, count: usize) -> Self {
        let (name, description, icon, examples): (&str, &str, &str, [&str; 3]) = match tool_type {
            ToolType::Api => (
                "API",
                "Connect to external services",
                "Globe",
                ["OpenWeatherMap", "NewsAPI", "GitHub API"],
            ),
            ToolType::Webhook => (
                "Webhook",
                "Send and receive webhooks",
                "Webhook",
                ["Zapier", "Discord Webhook", "Slack Webhook"],
            ),
            ToolType::Database => (
                "Database",
                "Connect to databases",
                "Database",
                ["PostgreSQL", "MongoDB", "Redis"],
            ),
            ToolType::File => (
                "File",
                "Process files",
                "File",
                ["CSV Reader", "PDF Parser", "Image Processor"],
            ),
            ToolType::Custom => (
                "Custom",
                "Tools built by users",
                "Settings",
                ["Custom Script", "Custom API", "Custom Function"],
            ),
        };

        Self {
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            examples: examples.iter().map(|e| e.to_string()).collect(),
            count,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tools", get(list_tools).post(create_tool))
        .route(
            "/tools/:tool_id",
            get(get_tool).put(update_tool).delete(delete_tool),
        )
}

fn service(state: &AppState) -> ToolService {
    ToolService::new(state.store.clone())
}

/// GET /tools - Tool catalog, categories or popular tools
#[utoipa::path(
    get,
    path = "/tools",
    params(
        ("action" = Option<String>, Query, description = "`categories` or `popular`"),
        ("category" = Option<String>, Query, description = "Only this tool type"),
        ("isBuiltIn" = Option<bool>, Query, description = "Filter on the built-in flag"),
        ("isActive" = Option<bool>, Query, description = "Filter on the active flag")
    ),
    responses(
        (status = 200, description = "Tools, built-in first", body = ApiResponse<Vec<Tool>>),
        (status = 400, description = "Unknown action or category", body = super::ErrorBody),
        (status = 401, description = "Authentication required", body = super::ErrorBody)
    ),
    tag = "tools"
)]
pub async fn list_tools(
    State(state): State<AppState>,
    _requester: Requester,
    ApiQuery(query): ApiQuery<ToolQuery>,
) -> ApiResult<Response> {
    let service = service(&state);
    match query.action.as_deref() {
        Some("categories") => {
            let categories: BTreeMap<&'static str, ToolCategory> =
                service.categories().await?;
            Ok(ApiResponse::new(categories).into_response())
        }
        Some("popular") => Ok(ApiResponse::list(service.popular().await?).into_response()),
        Some(other) => Err(ApiError::bad_request(format!("Unknown action '{}'", other))),
        None => {
            let tools = service.list(&query).await?;
            Ok(ApiResponse::list(tools).into_response())
        }
    }
}

/// POST /tools - Register a custom tool
#[utoipa::path(
    post,
    path = "/tools",
    request_body = CreateToolRequest,
    responses(
        (status = 201, description = "Tool created", body = ApiResponse<Tool>),
        (status = 400, description = "Validation failed", body = super::ErrorBody),
        (status = 401, description = "Authentication required", body = super::ErrorBody),
        (status = 409, description = "Tool name already used", body = super::ErrorBody)
    ),
    tag = "tools"
)]
pub async fn create_tool(
    State(state): State<AppState>,
    requester: Requester,
    ApiJson(req): ApiJson<CreateToolRequest>,
) -> ApiResult<Response> {
    let tool = service(&state).create(req, requester.token_user()).await?;
    Ok(created(
        ApiResponse::new(tool).with_message("Tool created successfully"),
    ))
}

/// GET /tools/{tool_id}
#[utoipa::path(
    get,
    path = "/tools/{tool_id}",
    params(("tool_id" = Uuid, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool found", body = ApiResponse<Tool>),
        (status = 401, description = "Authentication required", body = super::ErrorBody),
        (status = 404, description = "Tool not found", body = super::ErrorBody)
    ),
    tag = "tools"
)]
pub async fn get_tool(
    State(state): State<AppState>,
    _requester: Requester,
    ApiPath(tool_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Tool>> {
    Ok(ApiResponse::new(service(&state).get(tool_id).await?))
}

/// PUT /tools/{tool_id}
#[utoipa::path(
    put,
    path = "/tools/{tool_id}",
    params(("tool_id" = Uuid, Path, description = "Tool ID")),
    request_body = UpdateToolRequest,
    responses(
        (status = 200, description = "Tool updated", body = ApiResponse<Tool>),
        (status = 400, description = "Built-in tools cannot be deactivated", body = super::ErrorBody),
        (status = 401, description = "Authentication required", body = super::ErrorBody),
        (status = 404, description = "Tool not found", body = super::ErrorBody)
    ),
    tag = "tools"
)]
pub async fn update_tool(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(tool_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateToolRequest>,
) -> ApiResult<ApiResponse<Tool>> {
    let tool = service(&state)
        .update(tool_id, req, requester.token_user())
        .await?;
    Ok(ApiResponse::new(tool).with_message("Tool updated successfully"))
}

/// DELETE /tools/{tool_id} - Delete a custom tool
#[utoipa::path(
    delete,
    path = "/tools/{tool_id}",
    params(("tool_id" = Uuid, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool deleted"),
        (status = 400, description = "Built-in tools cannot be deleted", body = super::ErrorBody),
        (status = 401, description = "Authentication required", body = super::ErrorBody),
        (status = 404, description = "Tool not found", body = super::ErrorBody)
    ),
    tag = "tools"
)]
pub async fn delete_tool(
    State(state): State<AppState>,
    requester: Requester,
    ApiPath(tool_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    service(&state).delete(tool_id, requester.token_user()).await?;
    Ok(ApiResponse::new(()).with_message("Tool deleted successfully"))
}
