// API error taxonomy
//
// Every failure leaves the server as the same JSON envelope:
// { "success": false, "error": .., "code": .., "details"?: [..], "executionId"?: .. }

use agentdeck_core::{LlmError, StoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Error envelope returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Always false
    pub success: bool,
    /// Human-readable message
    pub error: String,
    /// Machine-readable error code
    #[schema(example = "BAD_REQUEST")]
    pub code: String,
    /// Individual validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    /// Execution the failure belongs to, when one was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<Uuid>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Vec<String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The resource exists but its state forbids the operation
    #[error("{0}")]
    InvalidState(String),

    #[error("{message}")]
    MethodNotAllowed { message: String },

    /// The LLM provider failed
    #[error("{message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        execution_id: Option<Uuid>,
    },

    /// Unexpected failure; the message is logged, never returned
    #[error("{message}")]
    Internal {
        message: String,
        execution_id: Option<Uuid>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn validation(details: Vec<String>) -> Self {
        ApiError::BadRequest {
            message: "Validation failed".to_string(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ApiError::InvalidState(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            execution_id: None,
        }
    }

    /// LLM failure attached to the execution it ended
    pub fn upstream(err: LlmError, execution_id: Uuid) -> Self {
        ApiError::Upstream {
            message: err.message,
            status: err.status,
            execution_id: Some(execution_id),
        }
    }

    /// Attach an execution id to an internal error
    pub fn for_execution(self, execution_id: Uuid) -> Self {
        match self {
            ApiError::Internal { message, .. } => ApiError::Internal {
                message,
                execution_id: Some(execution_id),
            },
            ApiError::Upstream {
                message, status, ..
            } => ApiError::Upstream {
                message,
                status,
                execution_id: Some(execution_id),
            },
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InvalidState(_) => "INVALID_STATE",
            ApiError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            ApiError::Upstream { .. } => "UPSTREAM_ERROR",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (error, details, execution_id) = match self {
            ApiError::BadRequest { message, details } => (message.clone(), details.clone(), None),
            ApiError::Upstream {
                message,
                execution_id,
                ..
            } => (message.clone(), Vec::new(), *execution_id),
            ApiError::Internal { execution_id, .. } => {
                ("Internal server error".to_string(), Vec::new(), *execution_id)
            }
            other => (other.to_string(), Vec::new(), None),
        };

        ErrorBody {
            success: false,
            error,
            code: self.code().to_string(),
            details,
            execution_id,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal { message, .. } => {
                tracing::error!(error = %message, "request failed")
            }
            ApiError::Upstream {
                message, status, ..
            } => tracing::warn!(error = %message, status = ?status, "upstream failure"),
            _ => {}
        }

        (self.status_code(), Json(self.to_body())).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => ApiError::Conflict(message),
            StoreError::InvalidReference(message) => ApiError::bad_request(message),
            other => ApiError::internal(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_is_400_with_own_code() {
        let err = ApiError::invalid_state("Agent is not active");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_body().code, "INVALID_STATE");
    }

    #[test]
    fn test_internal_message_is_not_leaked() {
        let err = ApiError::internal("connection refused").for_execution(Uuid::nil());
        let body = err.to_body();
        assert_eq!(body.error, "Internal server error");
        assert_eq!(body.execution_id, Some(Uuid::nil()));
    }

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        let conflict: ApiError = StoreError::conflict("tool 'x' already exists").into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let reference: ApiError = StoreError::invalid_reference("user missing").into();
        assert_eq!(reference.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_carries_execution_id() {
        let id = Uuid::now_v7();
        let err = ApiError::upstream(LlmError::with_status(503, "overloaded"), id);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["executionId"], id.to_string());
        assert_eq!(body["error"], "overloaded");
        assert!(body.get("details").is_none());
    }
}
