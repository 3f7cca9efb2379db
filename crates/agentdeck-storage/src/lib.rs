// Postgres storage layer with sqlx
//
// `Database` implements every store trait from agentdeck-core:
// - UserStore, AgentStore (user_store.rs, agent_store.rs)
// - ExecutionStore, AnalyticsStore (execution_store.rs)
// - ToolStore, WorkflowStore (tool_store.rs, workflow_store.rs)

mod agent_store;
mod execution_store;
pub mod models;
pub mod password;
pub mod repositories;
pub mod seed;
mod tool_store;
mod user_store;
mod workflow_store;

pub use password::{hash_password, verify_password};
pub use repositories::Database;
pub use seed::{builtin_tools, seed_builtin_tools};
