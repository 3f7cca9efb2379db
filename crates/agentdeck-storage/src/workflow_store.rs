// WorkflowStore on Postgres
//
// A workflow and its steps are written in one transaction.

use agentdeck_core::{
    NewWorkflow, NewWorkflowStep, StoreError, StoreResult, Workflow, WorkflowPatch, WorkflowStep,
    WorkflowStore,
};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{WorkflowRow, WorkflowStepRow, WORKFLOW_COLUMNS};
use crate::repositories::{map_db_error, Database};

const STEP_COLUMNS: &str = "id, workflow_id, name, step_type, config, position, agent_id";

async fn insert_steps(
    tx: &mut Transaction<'_, Postgres>,
    workflow_id: Uuid,
    steps: Vec<NewWorkflowStep>,
) -> StoreResult<()> {
    for step in steps {
        sqlx::query(
            r#"
            INSERT INTO workflow_steps (id, workflow_id, name, step_type, config, position, agent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(workflow_id)
        .bind(&step.name)
        .bind(&step.step_type)
        .bind(&step.config)
        .bind(step.position)
        .bind(step.agent_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_db_error("Failed to insert workflow step", e))?;
    }
    Ok(())
}

impl Database {
    async fn load_steps(
        &self,
        workflow_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, Vec<WorkflowStep>>> {
        let rows = sqlx::query_as::<_, WorkflowStepRow>(&format!(
            r#"
            SELECT {STEP_COLUMNS}
            FROM workflow_steps
            WHERE workflow_id = ANY($1)
            ORDER BY position ASC, id ASC
            "#
        ))
        .bind(workflow_ids)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to load workflow steps", e))?;

        let mut steps: HashMap<Uuid, Vec<WorkflowStep>> = HashMap::new();
        for row in rows {
            steps.entry(row.workflow_id).or_default().push(row.into());
        }
        Ok(steps)
    }
}

#[async_trait]
impl WorkflowStore for Database {
    async fn create_workflow(&self, input: NewWorkflow) -> StoreResult<Workflow> {
        let id = Uuid::now_v7();
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO workflows (id, user_id, name, description, status, config, triggers, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.status.as_str())
        .bind(&input.config)
        .bind(Json(&input.triggers))
        .bind(input.is_public)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to create workflow", e))?;

        insert_steps(&mut tx, id, input.steps).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit workflow", e))?;

        self.get_workflow(id)
            .await?
            .ok_or_else(|| StoreError::database(format!("workflow {} missing after insert", id)))
    }

    async fn get_workflow(&self, id: Uuid) -> StoreResult<Option<Workflow>> {
        let row = sqlx::query_as::<_, WorkflowRow>(&format!(
            "SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to get workflow", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut steps = self.load_steps(&[id]).await?;
        row.into_workflow(steps.remove(&id).unwrap_or_default())
            .map(Some)
    }

    async fn list_workflows(&self, user_id: Uuid) -> StoreResult<Vec<Workflow>> {
        let rows = sqlx::query_as::<_, WorkflowRow>(&format!(
            r#"
            SELECT {WORKFLOW_COLUMNS}
            FROM workflows
            WHERE user_id = $1
            ORDER BY updated_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to list workflows", e))?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut steps = self.load_steps(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let workflow_steps = steps.remove(&row.id).unwrap_or_default();
                row.into_workflow(workflow_steps)
            })
            .collect()
    }

    async fn update_workflow(
        &self,
        id: Uuid,
        patch: WorkflowPatch,
    ) -> StoreResult<Option<Workflow>> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE workflows
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                config = COALESCE($5, config),
                triggers = COALESCE($6, triggers),
                is_public = COALESCE($7, is_public),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(&patch.config)
        .bind(patch.triggers.as_ref().map(Json))
        .bind(patch.is_public)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error("Failed to update workflow", e))?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        if let Some(steps) = patch.steps {
            sqlx::query("DELETE FROM workflow_steps WHERE workflow_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_db_error("Failed to replace workflow steps", e))?;
            insert_steps(&mut tx, id, steps).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit workflow", e))?;

        self.get_workflow(id).await
    }

    async fn delete_workflow(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_db_error("Failed to delete workflow", e))?;

        Ok(result.rows_affected() > 0)
    }
}
