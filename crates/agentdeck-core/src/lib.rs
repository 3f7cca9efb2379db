// Agentdeck core
//
// Domain types shared by the API server and the storage layer, plus the
// traits that separate them from concrete backends:
// - Store traits (UserStore, AgentStore, ExecutionStore, ToolStore, WorkflowStore)
// - LlmClient for the chat-completion provider
//
// In-memory implementations live in `memory` for tests and examples.

pub mod agent;
pub mod analytics;
pub mod error;
pub mod execution;
pub mod llm;
pub mod llm_models;
pub mod memory;
pub mod tool;
pub mod traits;
pub mod trigger;
pub mod user;
pub mod workflow;

pub use agent::{Agent, AgentListItem, AgentPatch, AgentStatus, AgentType, NewAgent};
pub use analytics::{
    Analytics, AnalyticsFilter, AnalyticsType, ErrorReport, ErrorType, ExecutionMetrics,
    NewAnalytics,
};
pub use error::{StoreError, StoreResult};
pub use execution::{
    Execution, ExecutionFilter, ExecutionLog, ExecutionOutcome, ExecutionStats, ExecutionStatus,
    ExecutionType, LogLevel, NewExecution, NewExecutionLog,
};
pub use llm::{
    ChatMessage, ChatRole, Completion, CompletionRequest, LlmClient, LlmError, RemoteModel,
    TextStream, TokenUsage,
};
pub use llm_models::{ModelCategory, ModelInfo, MODEL_CATALOG};
pub use memory::{InMemoryStore, MockLlmClient, MockLlmResponse};
pub use tool::{NewTool, Tool, ToolFilter, ToolPatch, ToolType};
pub use traits::{
    AgentStore, AnalyticsStore, ExecutionStore, Store, ToolStore, UserStore, WorkflowStore,
};
pub use trigger::Trigger;
pub use user::{NewUser, User, UserCredentials, UserRole};
pub use workflow::{
    NewWorkflow, NewWorkflowStep, Workflow, WorkflowPatch, WorkflowStatus, WorkflowStep,
};
