//! Node-tree persistence: one row per node, keyed by `(workflow_id, id)`,
//! carrying the nested-set `(lft, rgt)` interval so a subtree can be
//! retrieved with a single range query against the root's interval.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::NodeRow, DbError};

/// Insert one node row.
pub async fn create_node(
    pool: &PgPool,
    workflow_id: Uuid,
    id: &str,
    name: &str,
    lft: i64,
    rgt: i64,
    executable_descriptor: Option<serde_json::Value>,
) -> Result<NodeRow, DbError> {
    let row: NodeRow = sqlx::query_as(
        r#"
        INSERT INTO nodes (id, workflow_id, name, lft, rgt, executable_descriptor)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, workflow_id, name, lft, rgt, executable_descriptor
        "#,
    )
    .bind(id)
    .bind(workflow_id)
    .bind(name)
    .bind(lft)
    .bind(rgt)
    .bind(executable_descriptor)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch every node whose interval falls within `[lft, rgt]` of `workflow_id`
/// — i.e. the subtree rooted at whatever node owns that interval.
pub async fn get_subtree(pool: &PgPool, workflow_id: Uuid, lft: i64, rgt: i64) -> Result<Vec<NodeRow>, DbError> {
    let rows: Vec<NodeRow> = sqlx::query_as(
        r#"
        SELECT id, workflow_id, name, lft, rgt, executable_descriptor
        FROM nodes
        WHERE workflow_id = $1 AND lft >= $2 AND rgt <= $3
        ORDER BY lft ASC
        "#,
    )
    .bind(workflow_id)
    .bind(lft)
    .bind(rgt)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
