//! [`engine::DbService`] adapter backed by Postgres.

use async_trait::async_trait;
use engine::{DbService, Node, ResultCode, Workflow};
use uuid::Uuid;

use crate::pool::DbPool;
use crate::repository::{executions, nodes, workflows};

pub struct PostgresDbService {
    pool: DbPool,
}

impl PostgresDbService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn persist_subtree<'a>(
        &'a self,
        workflow_id: Uuid,
        node: &'a Node,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), crate::DbError>> + Send + 'a>> {
        Box::pin(async move {
            let (lft, rgt) = node.interval();
            let descriptor = node
                .executable()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|e| crate::DbError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;

            nodes::create_node(&self.pool, workflow_id, node.id(), node.name(), lft as i64, rgt as i64, descriptor)
                .await?;

            for child in node.children() {
                self.persist_subtree(workflow_id, child).await?;
            }
            Ok(())
        })
    }
}

#[async_trait]
impl DbService for PostgresDbService {
    async fn add_workflow(&self, workflow: &Workflow) -> anyhow::Result<()> {
        workflows::create_workflow(&self.pool, workflow.id(), workflow.name()).await?;
        self.persist_subtree(workflow.id(), workflow.root()).await?;
        Ok(())
    }

    async fn start_execution(&self, workflow_id: Uuid, node_id: &str) -> anyhow::Result<()> {
        executions::start_execution(&self.pool, workflow_id, node_id).await?;
        Ok(())
    }

    async fn end_execution(&self, workflow_id: Uuid, node_id: &str, outcome: ResultCode) -> anyhow::Result<()> {
        executions::end_execution(&self.pool, workflow_id, node_id, &outcome.to_string()).await?;
        Ok(())
    }
}
