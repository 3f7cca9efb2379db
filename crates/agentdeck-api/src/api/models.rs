// LLM model listing routes
// Decision: The provider's live list is preferred; the static catalog answers when the provider is down

use agentdeck_core::llm_models::{ModelCategory, ModelInfo, MODEL_CATALOG, PROVIDER};
use agentdeck_core::RemoteModel;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::common::{ApiQuery, ApiResponse};
use super::error::{ApiError, ApiResult};
use crate::AppState;

/// Context size assumed when the provider does not report one
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsQuery {
    /// `test` or `categories`; absent for the model list
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub max_tokens: u32,
    pub provider: String,
    pub available: bool,
    /// Only set for catalog entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<RemoteModel> for ModelEntry {
    fn from(model: RemoteModel) -> Self {
        Self {
            name: model.id.clone(),
            id: model.id,
            max_tokens: model.context_length.unwrap_or(DEFAULT_MAX_TOKENS),
            provider: PROVIDER.to_string(),
            available: true,
            description: None,
        }
    }
}

impl From<&ModelInfo> for ModelEntry {
    fn from(model: &ModelInfo) -> Self {
        Self {
            id: model.id.to_string(),
            name: model.name.to_string(),
            max_tokens: model.max_tokens,
            provider: PROVIDER.to_string(),
            available: true,
            description: Some(model.description().to_string()),
        }
    }
}

/// Where a model list came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    Api,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    pub success: bool,
    pub data: Vec<ModelEntry>,
    pub count: usize,
    pub source: ModelSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
    pub models_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelCategoryGroup {
    pub name: String,
    pub description: String,
    pub models: Vec<ModelEntry>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/models", get(list_models))
}

/// GET /models - Available models, connection test or categories
#[utoipa::path(
    get,
    path = "/models",
    params(("action" = Option<String>, Query, description = "`test` or `categories`")),
    responses(
        (status = 200, description = "Model list", body = ModelsResponse),
        (status = 400, description = "Unknown action", body = super::ErrorBody)
    ),
    tag = "models"
)]
pub async fn list_models(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ModelsQuery>,
) -> ApiResult<Response> {
    match query.action.as_deref() {
        None => Ok(Json(models(&state).await).into_response()),
        Some("test") => Ok(test_connection(&state).await.into_response()),
        Some("categories") => Ok(ApiResponse::new(categories()).into_response()),
        Some(other) => Err(ApiError::bad_request(format!("Unknown action '{}'", other))),
    }
}

async fn models(state: &AppState) -> ModelsResponse {
    let (data, source) = match state.llm.list_models().await {
        Ok(remote) => (
            remote.into_iter().map(ModelEntry::from).collect::<Vec<_>>(),
            ModelSource::Api,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch models from provider, using catalog");
            (
                MODEL_CATALOG.iter().map(ModelEntry::from).collect(),
                ModelSource::Static,
            )
        }
    };

    ModelsResponse {
        success: true,
        count: data.len(),
        data,
        source,
    }
}

async fn test_connection(state: &AppState) -> ApiResponse<ConnectionTest> {
    let result = match state.llm.list_models().await {
        Ok(models) => ConnectionTest {
            success: true,
            message: "Connection successful".to_string(),
            models_count: models.len(),
        },
        Err(e) => ConnectionTest {
            success: false,
            message: e.message,
            models_count: 0,
        },
    };

    let message = if result.success {
        "Connection successful"
    } else {
        "Connection failed"
    };
    let mut response = ApiResponse::new(result).with_message(message);
    response.success = response.data.success;
    response
}

fn categories() -> BTreeMap<&'static str, ModelCategoryGroup> {
    ModelCategory::ALL
        .iter()
        .map(|category| {
            let group = ModelCategoryGroup {
                name: category.name().to_string(),
                description: category.description().to_string(),
                models: category.models().into_iter().map(ModelEntry::from).collect(),
            };
            (category.key(), group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_model_defaults_context() {
        let entry = ModelEntry::from(RemoteModel {
            id: "mystery".to_string(),
            context_length: None,
            owned_by: None,
        });
        assert_eq!(entry.name, "mystery");
        assert_eq!(entry.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(entry.provider, "llm7.io");
    }

    #[test]
    fn test_categories_cover_catalog_groups() {
        let groups = categories();
        assert_eq!(groups.len(), 5);
        assert!(groups["coding"]
            .models
            .iter()
            .any(|m| m.id == "codestral-2501"));
    }
}
