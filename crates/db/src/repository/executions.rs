//! Execution bookkeeping: one row per `start_execution`/`end_execution`
//! pair the engine reports for a node.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::ExecutionRow, DbError};

/// Open a new execution record for `node_id`, with `end_at`/`result_code`
/// unset.
pub async fn start_execution(pool: &PgPool, workflow_id: Uuid, node_id: &str) -> Result<ExecutionRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row: ExecutionRow = sqlx::query_as(
        r#"
        INSERT INTO executions (id, workflow_id, node_id, start_at, end_at, result_code)
        VALUES ($1, $2, $3, $4, NULL, NULL)
        RETURNING id, workflow_id, node_id, start_at, end_at, result_code
        "#,
    )
    .bind(id)
    .bind(workflow_id)
    .bind(node_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Close the most recently opened execution record for `node_id` with its
/// final `result_code`.
pub async fn end_execution(
    pool: &PgPool,
    workflow_id: Uuid,
    node_id: &str,
    result_code: &str,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE executions
        SET end_at = $1, result_code = $2
        WHERE id = (
            SELECT id FROM executions
            WHERE workflow_id = $3 AND node_id = $4 AND end_at IS NULL
            ORDER BY start_at DESC
            LIMIT 1
        )
        "#,
    )
    .bind(Utc::now())
    .bind(result_code)
    .bind(workflow_id)
    .bind(node_id)
    .execute(pool)
    .await?;

    Ok(())
}
