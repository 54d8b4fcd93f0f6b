//! Workflow CRUD operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::WorkflowRow, DbError};

/// Insert a new workflow row.
pub async fn create_workflow(pool: &PgPool, id: Uuid, name: &str) -> Result<WorkflowRow, DbError> {
    let now = Utc::now();

    let row: WorkflowRow = sqlx::query_as(
        r#"
        INSERT INTO workflows (id, name, created_at, result_code)
        VALUES ($1, $2, $3, NULL)
        RETURNING id, name, created_at, result_code
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single workflow by its primary key.
pub async fn get_workflow(pool: &PgPool, id: Uuid) -> Result<WorkflowRow, DbError> {
    let row: Option<WorkflowRow> = sqlx::query_as(
        r#"SELECT id, name, created_at, result_code FROM workflows WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Return all workflows ordered by creation time (newest first).
pub async fn list_workflows(pool: &PgPool) -> Result<Vec<WorkflowRow>, DbError> {
    let rows: Vec<WorkflowRow> =
        sqlx::query_as(r#"SELECT id, name, created_at, result_code FROM workflows ORDER BY created_at DESC"#)
            .fetch_all(pool)
            .await?;

    Ok(rows)
}
