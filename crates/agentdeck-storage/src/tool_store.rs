// ToolStore on Postgres

use agentdeck_core::{NewTool, StoreResult, Tool, ToolFilter, ToolPatch, ToolStore};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ToolRow, TOOL_COLUMNS};
use crate::repositories::{map_db_error, Database};

#[async_trait]
impl ToolStore for Database {
    async fn create_tool(&self, input: NewTool) -> StoreResult<Tool> {
        let row = sqlx::query_as::<_, ToolRow>(&format!(
            r#"
            INSERT INTO tools (id, name, description, tool_type, config, schema, is_built_in, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TOOL_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.tool_type.as_str())
        .bind(&input.config)
        .bind(&input.schema)
        .bind(input.is_built_in)
        .bind(input.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to create tool", e))?;

        row.try_into()
    }

    async fn upsert_builtin_tool(&self, input: NewTool) -> StoreResult<Tool> {
        let row = sqlx::query_as::<_, ToolRow>(&format!(
            r#"
            INSERT INTO tools (id, name, description, tool_type, config, schema, is_built_in, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
            ON CONFLICT (name) DO UPDATE
            SET
                description = EXCLUDED.description,
                tool_type = EXCLUDED.tool_type,
                config = EXCLUDED.config,
                schema = EXCLUDED.schema,
                is_built_in = TRUE,
                updated_at = NOW()
            RETURNING {TOOL_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.tool_type.as_str())
        .bind(&input.config)
        .bind(&input.schema)
        .bind(input.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to upsert built-in tool", e))?;

        row.try_into()
    }

    async fn get_tool(&self, id: Uuid) -> StoreResult<Option<Tool>> {
        let row = sqlx::query_as::<_, ToolRow>(&format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to get tool", e))?;

        row.map(Tool::try_from).transpose()
    }

    async fn list_tools(&self, filter: ToolFilter) -> StoreResult<Vec<Tool>> {
        let rows = sqlx::query_as::<_, ToolRow>(&format!(
            r#"
            SELECT {TOOL_COLUMNS}
            FROM tools
            WHERE ($1::text IS NULL OR tool_type = $1)
              AND ($2::boolean IS NULL OR is_built_in = $2)
              AND ($3::boolean IS NULL OR is_active = $3)
            ORDER BY is_built_in DESC, name ASC
            LIMIT $4
            "#
        ))
        .bind(filter.tool_type.map(|t| t.as_str()))
        .bind(filter.is_built_in)
        .bind(filter.is_active)
        .bind(filter.limit.map(|l| l as i64))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to list tools", e))?;

        rows.into_iter().map(Tool::try_from).collect()
    }

    async fn update_tool(&self, id: Uuid, patch: ToolPatch) -> StoreResult<Option<Tool>> {
        let row = sqlx::query_as::<_, ToolRow>(&format!(
            r#"
            UPDATE tools
            SET
                description = COALESCE($2, description),
                tool_type = COALESCE($3, tool_type),
                config = COALESCE($4, config),
                schema = COALESCE($5, schema),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TOOL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.description)
        .bind(patch.tool_type.map(|t| t.as_str()))
        .bind(&patch.config)
        .bind(&patch.schema)
        .bind(patch.is_active)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to update tool", e))?;

        row.map(Tool::try_from).transpose()
    }

    async fn delete_tool(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tools WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_db_error("Failed to delete tool", e))?;

        Ok(result.rows_affected() > 0)
    }
}
