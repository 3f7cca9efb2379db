// AgentStore on Postgres
//
// Deleting an agent relies on the foreign keys: executions and their logs
// cascade, analytics and workflow steps are set to NULL.

use agentdeck_core::{Agent, AgentListItem, AgentPatch, AgentStore, NewAgent, StoreResult};
use async_trait::async_trait;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use crate::models::{AgentRow, AgentWithCountRow, AGENT_COLUMNS};
use crate::repositories::{map_db_error, Database};

#[async_trait]
impl AgentStore for Database {
    async fn create_agent(&self, input: NewAgent) -> StoreResult<Agent> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            INSERT INTO agents (
                id, user_id, name, description, agent_type, status, model,
                temperature, max_tokens, system_prompt, tools, triggers, is_public
            )
            VALUES ($1, $2, $3, $4, $5, 'INACTIVE', $6, $7, $8, $9, $10, $11, $12)
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.agent_type.as_str())
        .bind(&input.model)
        .bind(input.temperature)
        .bind(input.max_tokens as i32)
        .bind(&input.system_prompt)
        .bind(&input.tools)
        .bind(Json(&input.triggers))
        .bind(input.is_public)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to create agent", e))?;

        debug!(agent_id = %row.id, "created agent");
        row.try_into()
    }

    async fn get_agent(&self, id: Uuid) -> StoreResult<Option<Agent>> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to get agent", e))?;

        row.map(Agent::try_from).transpose()
    }

    async fn list_agents(&self, user_id: Uuid) -> StoreResult<Vec<AgentListItem>> {
        let rows = sqlx::query_as::<_, AgentWithCountRow>(&format!(
            r#"
            SELECT {AGENT_COLUMNS},
                (SELECT COUNT(*) FROM executions e WHERE e.agent_id = agents.id) AS execution_count
            FROM agents
            WHERE user_id = $1
            ORDER BY updated_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to list agents", e))?;

        rows.into_iter().map(AgentListItem::try_from).collect()
    }

    async fn update_agent(&self, id: Uuid, patch: AgentPatch) -> StoreResult<Option<Agent>> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            UPDATE agents
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                agent_type = COALESCE($4, agent_type),
                status = COALESCE($5, status),
                model = COALESCE($6, model),
                temperature = COALESCE($7, temperature),
                max_tokens = COALESCE($8, max_tokens),
                system_prompt = COALESCE($9, system_prompt),
                tools = COALESCE($10, tools),
                triggers = COALESCE($11, triggers),
                is_public = COALESCE($12, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.agent_type.map(|t| t.as_str()))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(&patch.model)
        .bind(patch.temperature)
        .bind(patch.max_tokens.map(|m| m as i32))
        .bind(&patch.system_prompt)
        .bind(&patch.tools)
        .bind(patch.triggers.as_ref().map(Json))
        .bind(patch.is_public)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to update agent", e))?;

        row.map(Agent::try_from).transpose()
    }

    async fn delete_agent(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM agents WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_db_error("Failed to delete agent", e))?;

        Ok(result.rows_affected() > 0)
    }
}
