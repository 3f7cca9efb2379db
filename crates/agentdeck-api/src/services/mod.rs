// Services layer: business rules between the HTTP handlers and the store

pub mod agent;
pub mod execution;
pub mod tool;
pub mod workflow;

pub use agent::AgentService;
pub use execution::ExecutionService;
pub use tool::ToolService;
pub use workflow::WorkflowService;
