// OpenAPI document for the REST surface
// Decision: Served by the router at /api-doc/openapi.json and printed by the export-openapi binary

use agentdeck_core::{
    Agent, AgentListItem, AgentStatus, AgentType, ErrorType, Execution, ExecutionLog,
    ExecutionStatus, ExecutionType, LogLevel, TokenUsage, Tool, ToolType, Trigger, User,
    UserRole, Workflow, WorkflowStatus, WorkflowStep,
};
use utoipa::OpenApi;

use crate::api::{self, ApiResponse, ErrorBody};
use crate::auth;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::agents::list_agents,
        api::agents::create_agent,
        api::agents::get_agent,
        api::agents::update_agent,
        api::agents::delete_agent,
        api::executions::execute_agent,
        api::executions::list_executions,
        api::executions::get_execution,
        api::workflows::list_workflows,
        api::workflows::create_workflow,
        api::workflows::get_workflow,
        api::workflows::update_workflow,
        api::workflows::delete_workflow,
        api::tools::list_tools,
        api::tools::create_tool,
        api::tools::get_tool,
        api::tools::update_tool,
        api::tools::delete_tool,
        api::models::list_models,
        api::analytics::get_dashboard,
        api::analytics::list_errors,
        auth::routes::login,
        auth::routes::get_current_user,
    ),
    components(
        schemas(
            // Domain types
            Agent, AgentType, AgentStatus, AgentListItem, Trigger,
            Execution, ExecutionType, ExecutionStatus, ExecutionLog, LogLevel, TokenUsage,
            Workflow, WorkflowStatus, WorkflowStep,
            Tool, ToolType,
            User, UserRole,
            ErrorType,
            // Request/response types
            ErrorBody,
            api::agents::CreateAgentRequest, api::agents::UpdateAgentRequest,
            api::agents::AgentDetail,
            api::executions::ExecuteRequest, api::executions::ExecutionResult,
            api::executions::StreamEvent, api::executions::ExecutionDetail,
            api::workflows::WorkflowStepInput,
            api::workflows::CreateWorkflowRequest, api::workflows::UpdateWorkflowRequest,
            api::workflows::WorkflowListItem,
            api::tools::CreateToolRequest, api::tools::UpdateToolRequest,
            api::tools::ToolCategory,
            api::models::ModelEntry, api::models::ModelSource, api::models::ModelsResponse,
            api::models::ConnectionTest, api::models::ModelCategoryGroup,
            api::analytics::Dashboard, api::analytics::AgentCounts,
            api::analytics::WorkflowCounts, api::analytics::ExecutionCounts,
            api::analytics::ErrorEntry,
            auth::routes::LoginRequest, auth::routes::AuthResponse,
            ApiResponse<Agent>,
            ApiResponse<Workflow>,
            ApiResponse<Tool>,
            ApiResponse<Vec<Execution>>,
        )
    ),
    tags(
        (name = "agents", description = "Agent management endpoints"),
        (name = "executions", description = "Agent execution and history endpoints"),
        (name = "workflows", description = "Workflow definition endpoints"),
        (name = "tools", description = "Tool registry endpoints"),
        (name = "models", description = "LLM model listing endpoints"),
        (name = "analytics", description = "Dashboard analytics endpoints"),
        (name = "auth", description = "Login and current user endpoints")
    ),
    info(
        title = "Agentdeck API",
        description = "API for building, running and monitoring LLM agents",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Pretty-printed OpenAPI JSON
    pub fn to_json() -> String {
        Self::openapi().to_pretty_json().unwrap_or_default()
    }
}
