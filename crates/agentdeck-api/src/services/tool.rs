// Tool registry service

use agentdeck_core::{NewTool, Store, Tool, ToolFilter, ToolPatch, ToolType};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::tools::{CreateToolRequest, ToolCategory, ToolQuery, UpdateToolRequest};
use crate::api::validation::{trimmed, Validator, MAX_DESCRIPTION_BYTES, MIN_TOOL_NAME_CHARS};
use crate::api::{ApiError, ApiResult};

const POPULAR_LIMIT: usize = 10;

pub struct ToolService {
    store: Arc<dyn Store>,
}

impl ToolService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &ToolQuery) -> ApiResult<Vec<Tool>> {
        let tool_type = match query.category.as_deref() {
            Some(category) => Some(parse_tool_type(category)?),
            None => None,
        };
        let filter = ToolFilter {
            tool_type,
            is_built_in: query.is_built_in,
            is_active: query.is_active,
            limit: None,
        };
        Ok(self.store.list_tools(filter).await?)
    }

    /// Every category keyed by its type, with the active tool count
    pub async fn categories(&self) -> ApiResult<BTreeMap<&'static str, ToolCategory>> {
        let active = self
            .store
            .list_tools(ToolFilter {
                is_active: Some(true),
                ..Default::default()
            })
            .await?;

        Ok(ToolType::ALL
            .iter()
            .map(|t| {
                let count = active.iter().filter(|tool| tool.tool_type == *t).count();
                (t.as_str(), ToolCategory::new(*t, count))
            })
            .collect())
    }

    pub async fn popular(&self) -> ApiResult<Vec<Tool>> {
        let filter = ToolFilter {
            is_built_in: Some(true),
            is_active: Some(true),
            limit: Some(POPULAR_LIMIT),
            ..Default::default()
        };
        Ok(self.store.list_tools(filter).await?)
    }

    pub async fn get(&self, tool_id: Uuid) -> ApiResult<Tool> {
        self.store
            .get_tool(tool_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Tool not found"))
    }

    /// `actor` is the token user, when one was presented
    pub async fn create(&self, req: CreateToolRequest, actor: Option<Uuid>) -> ApiResult<Tool> {
        Validator::new()
            .required_name("name", req.name.as_deref(), MIN_TOOL_NAME_CHARS)
            .max_bytes("description", req.description.as_deref(), MAX_DESCRIPTION_BYTES)
            .finish()?;

        let name = Tool::normalize_name(req.name.as_deref().unwrap_or_default());
        let tool = self
            .store
            .create_tool(NewTool {
                name: name.clone(),
                description: trimmed(req.description),
                tool_type: req.tool_type.unwrap_or(ToolType::Custom),
                config: req.config.unwrap_or_else(|| json!({})),
                schema: req.schema,
                is_built_in: false,
                is_active: true,
            })
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    ApiError::conflict(format!("A tool named '{}' already exists", name))
                } else {
                    e.into()
                }
            })?;

        tracing::info!(tool_id = %tool.id, name = %tool.name, actor = ?actor, "tool created");
        Ok(tool)
    }

    /// Built-in tools accept edits but stay active
    pub async fn update(
        &self,
        tool_id: Uuid,
        req: UpdateToolRequest,
        actor: Option<Uuid>,
    ) -> ApiResult<Tool> {
        Validator::new()
            .max_bytes("description", req.description.as_deref(), MAX_DESCRIPTION_BYTES)
            .finish()?;

        let current = self.get(tool_id).await?;
        if current.is_built_in && req.is_active == Some(false) {
            return Err(ApiError::invalid_state("Built-in tools cannot be deactivated"));
        }

        let patch = ToolPatch {
            description: req.description.map(|d| d.trim().to_string()),
            tool_type: req.tool_type,
            config: req.config,
            schema: req.schema,
            is_active: req.is_active,
        };
        let tool = self
            .store
            .update_tool(tool_id, patch)
            .await?
            .ok_or_else(|| ApiError::not_found("Tool not found"))?;

        tracing::info!(tool_id = %tool.id, actor = ?actor, "tool updated");
        Ok(tool)
    }

    pub async fn delete(&self, tool_id: Uuid, actor: Option<Uuid>) -> ApiResult<()> {
        let tool = self.get(tool_id).await?;
        if tool.is_built_in {
            return Err(ApiError::invalid_state("Built-in tools cannot be deleted"));
        }
        if !self.store.delete_tool(tool_id).await? {
            return Err(ApiError::not_found("Tool not found"));
        }
        tracing::info!(tool_id = %tool_id, name = %tool.name, actor = ?actor, "tool deleted");
        Ok(())
    }
}

fn parse_tool_type(category: &str) -> ApiResult<ToolType> {
    let upper = category.trim().to_uppercase();
    ToolType::ALL
        .into_iter()
        .find(|t| t.as_str() == upper)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown tool category '{}'", category)))
}
