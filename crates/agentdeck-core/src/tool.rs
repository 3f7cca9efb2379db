// Tool registry types
//
// Tools are a catalog only: agents reference them by name, nothing invokes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolType {
    Api,
    Webhook,
    Database,
    File,
    Custom,
}

impl ToolType {
    pub const ALL: [ToolType; 5] = [
        ToolType::Api,
        ToolType::Webhook,
        ToolType::Database,
        ToolType::File,
        ToolType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Api => "API",
            ToolType::Webhook => "WEBHOOK",
            ToolType::Database => "DATABASE",
            ToolType::File => "FILE",
            ToolType::Custom => "CUSTOM",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub config: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub schema: Option<Value>,
    pub is_built_in: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// Canonical stored form of a tool name
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct NewTool {
    /// Already normalized
    pub name: String,
    pub description: Option<String>,
    pub tool_type: ToolType,
    pub config: Value,
    pub schema: Option<Value>,
    pub is_built_in: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToolPatch {
    pub description: Option<String>,
    pub tool_type: Option<ToolType>,
    pub config: Option<Value>,
    pub schema: Option<Value>,
    pub is_active: Option<bool>,
}

impl ToolPatch {
    pub fn apply(self, tool: &mut Tool) {
        if let Some(description) = self.description {
            tool.description = Some(description);
        }
        if let Some(tool_type) = self.tool_type {
            tool.tool_type = tool_type;
        }
        if let Some(config) = self.config {
            tool.config = config;
        }
        if let Some(schema) = self.schema {
            tool.schema = Some(schema);
        }
        if let Some(is_active) = self.is_active {
            tool.is_active = is_active;
        }
    }
}

/// Catalog query. Results are built-in first, then ordered by name.
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    pub tool_type: Option<ToolType>,
    pub is_built_in: Option<bool>,
    pub is_active: Option<bool>,
    pub limit: Option<usize>,
}

impl ToolFilter {
    pub fn matches(&self, tool: &Tool) -> bool {
        self.tool_type.map_or(true, |t| tool.tool_type == t)
            && self.is_built_in.map_or(true, |b| tool.is_built_in == b)
            && self.is_active.map_or(true, |a| tool.is_active == a)
    }
}
