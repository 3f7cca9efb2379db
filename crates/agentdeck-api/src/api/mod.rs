// HTTP API routes
//
// This module contains all HTTP route handlers for the public API.
// Every submodule exposes `routes()` over the shared AppState.

pub mod agents;
pub mod analytics;
pub mod common;
pub mod error;
pub mod executions;
pub mod models;
pub mod tools;
pub mod validation;
pub mod workflows;

// Re-export common types
pub use common::{created, ApiJson, ApiPath, ApiQuery, ApiResponse};
pub use error::{ApiError, ApiResult, ErrorBody};
