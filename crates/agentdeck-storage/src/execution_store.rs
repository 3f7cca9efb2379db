// ExecutionStore and AnalyticsStore on Postgres

use agentdeck_core::{
    Analytics, AnalyticsFilter, AnalyticsStore, Execution, ExecutionFilter, ExecutionLog,
    ExecutionOutcome, ExecutionStats, ExecutionStore, NewAnalytics, NewExecution,
    NewExecutionLog, StoreResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    AnalyticsRow, ExecutionLogRow, ExecutionRow, ExecutionStatsRow, EXECUTION_COLUMNS,
};
use crate::repositories::{map_db_error, Database};

#[async_trait]
impl ExecutionStore for Database {
    async fn create_execution(&self, input: NewExecution) -> StoreResult<Execution> {
        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            r#"
            INSERT INTO executions (id, execution_type, status, input, started_at, user_id, agent_id)
            VALUES ($1, 'AGENT', 'RUNNING', $2, $3, $4, $5)
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.input)
        .bind(input.started_at)
        .bind(input.user_id)
        .bind(input.agent_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to create execution", e))?;

        debug!(execution_id = %row.id, agent_id = %row.agent_id, "created execution");
        row.try_into()
    }

    async fn finish_execution(
        &self,
        id: Uuid,
        outcome: ExecutionOutcome,
        finished_at: DateTime<Utc>,
    ) -> StoreResult<Option<Execution>> {
        let status = outcome.status();
        let (output, error): (Option<Value>, Option<String>) = match outcome {
            ExecutionOutcome::Succeeded { output } => (Some(output), None),
            ExecutionOutcome::Failed { error } => (None, Some(error)),
            ExecutionOutcome::Cancelled { reason } => (None, Some(reason)),
        };

        // The status guard makes the terminal transition happen at most once
        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            r#"
            UPDATE executions
            SET
                status = $2,
                output = $3,
                error = $4,
                finished_at = $5,
                duration = FLOOR(EXTRACT(EPOCH FROM ($5 - started_at)) * 1000)::BIGINT
            WHERE id = $1 AND status = 'RUNNING'
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(&output)
        .bind(&error)
        .bind(finished_at)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to finish execution", e))?;

        row.map(Execution::try_from).transpose()
    }

    async fn get_execution(&self, id: Uuid) -> StoreResult<Option<Execution>> {
        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            "SELECT {EXECUTION_COLUMNS} FROM executions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to get execution", e))?;

        row.map(Execution::try_from).transpose()
    }

    async fn list_executions(&self, filter: ExecutionFilter) -> StoreResult<Vec<Execution>> {
        let rows = sqlx::query_as::<_, ExecutionRow>(&format!(
            r#"
            SELECT {EXECUTION_COLUMNS}
            FROM executions
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR agent_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY started_at DESC, id DESC
            LIMIT $4
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.agent_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.limit as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to list executions", e))?;

        rows.into_iter().map(Execution::try_from).collect()
    }

    async fn count_executions(&self, agent_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM executions WHERE agent_id = $1")
            .bind(agent_id)
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_db_error("Failed to count executions", e))?;

        Ok(count)
    }

    async fn execution_stats(
        &self,
        user_id: Uuid,
        today_start: DateTime<Utc>,
        week_start: DateTime<Utc>,
    ) -> StoreResult<ExecutionStats> {
        let row = sqlx::query_as::<_, ExecutionStatsRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE started_at >= $2) AS today,
                COUNT(*) FILTER (WHERE started_at >= $3) AS this_week,
                COUNT(*) FILTER (WHERE status = 'SUCCESS') AS success,
                COUNT(*) FILTER (WHERE status = 'FAILED') AS failed,
                COUNT(*) FILTER (WHERE status = 'RUNNING') AS running,
                COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled
            FROM executions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(today_start)
        .bind(week_start)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to compute execution stats", e))?;

        Ok(ExecutionStats {
            total: row.total,
            today: row.today,
            this_week: row.this_week,
            success: row.success,
            failed: row.failed,
            running: row.running,
            cancelled: row.cancelled,
        })
    }

    async fn append_log(&self, input: NewExecutionLog) -> StoreResult<ExecutionLog> {
        let row = sqlx::query_as::<_, ExecutionLogRow>(
            r#"
            INSERT INTO execution_logs (id, execution_id, level, message, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, execution_id, level, message, data, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.execution_id)
        .bind(input.level.as_str())
        .bind(&input.message)
        .bind(&input.data)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to append execution log", e))?;

        row.try_into()
    }

    async fn list_logs(&self, execution_id: Uuid) -> StoreResult<Vec<ExecutionLog>> {
        let rows = sqlx::query_as::<_, ExecutionLogRow>(
            r#"
            SELECT id, execution_id, level, message, data, created_at
            FROM execution_logs
            WHERE execution_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(execution_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to list execution logs", e))?;

        rows.into_iter().map(ExecutionLog::try_from).collect()
    }
}

#[async_trait]
impl AnalyticsStore for Database {
    async fn record_analytics(&self, input: NewAnalytics) -> StoreResult<Analytics> {
        let row = sqlx::query_as::<_, AnalyticsRow>(
            r#"
            INSERT INTO analytics (id, analytics_type, data, user_id, agent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, analytics_type, data, user_id, agent_id, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.analytics_type.as_str())
        .bind(&input.data)
        .bind(input.user_id)
        .bind(input.agent_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to record analytics", e))?;

        row.try_into()
    }

    async fn list_analytics(&self, filter: AnalyticsFilter) -> StoreResult<Vec<Analytics>> {
        let rows = sqlx::query_as::<_, AnalyticsRow>(
            r#"
            SELECT id, analytics_type, data, user_id, agent_id, created_at
            FROM analytics
            WHERE user_id = $1
              AND ($2::text IS NULL OR analytics_type = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.analytics_type.map(|t| t.as_str()))
        .bind(filter.limit.map(|l| l as i64))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to list analytics", e))?;

        rows.into_iter().map(Analytics::try_from).collect()
    }

    async fn total_tokens(&self, user_id: Uuid) -> StoreResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM((data->>'totalTokens')::BIGINT), 0)::BIGINT
            FROM analytics
            WHERE user_id = $1 AND analytics_type = 'EXECUTION'
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to sum token usage", e))?;

        Ok(total)
    }
}
