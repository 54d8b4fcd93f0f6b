//! Service-interface seams the engine is driven through, never looked up
//! globally: a [`DbService`] persists workflow/execution bookkeeping, a
//! [`StorageService`] receives captured stdout/stderr bytes as they arrive.
//!
//! Both traits take owned or borrowed identifiers (`Uuid`, `&str`) rather
//! than `&Workflow`/`&Node`, since implementations are driven from inside
//! `tokio::spawn`'d stream-reader tasks that must be `'static`.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ResultCode, Workflow};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no storage backend configured for artifact stream '{stream}' on node '{node_id}'")]
    UnsupportedArtifact { node_id: String, stream: String },

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Persists workflow definitions and per-node execution bookkeeping.
#[async_trait]
pub trait DbService: Send + Sync {
    /// Record a newly constructed workflow, called once before execution
    /// starts.
    async fn add_workflow(&self, workflow: &Workflow) -> anyhow::Result<()>;

    /// Record that `node_id` within `workflow_id` has begun executing.
    async fn start_execution(&self, workflow_id: Uuid, node_id: &str) -> anyhow::Result<()>;

    /// Record that `node_id` within `workflow_id` finished with `outcome`.
    async fn end_execution(
        &self,
        workflow_id: Uuid,
        node_id: &str,
        outcome: ResultCode,
    ) -> anyhow::Result<()>;
}

/// Receives captured stdout/stderr bytes as a node's process produces them.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Append `data` to the named artifact stream (`"stdout"` or
    /// `"stderr"`) belonging to `node_id` within `workflow_id`.
    async fn append_to_artifact(
        &self,
        workflow_id: Uuid,
        node_id: &str,
        stream_name: &str,
        data: &[u8],
    ) -> Result<(), StorageError>;
}

/// Does nothing; used when no database is configured. The in-memory
/// [`crate::models::NodeResult`] still carries the full captured bytes
/// regardless of which storage backend is wired in.
pub struct NoopDbService;

#[async_trait]
impl DbService for NoopDbService {
    async fn add_workflow(&self, _workflow: &Workflow) -> anyhow::Result<()> {
        Ok(())
    }

    async fn start_execution(&self, _workflow_id: Uuid, _node_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn end_execution(
        &self,
        _workflow_id: Uuid,
        _node_id: &str,
        _outcome: ResultCode,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Mirrors captured output to the engine process's own stdout/stderr;
/// rejects any other stream name.
pub struct NoopStorageService;

#[async_trait]
impl StorageService for NoopStorageService {
    async fn append_to_artifact(
        &self,
        _workflow_id: Uuid,
        node_id: &str,
        stream_name: &str,
        data: &[u8],
    ) -> Result<(), StorageError> {
        use tokio::io::AsyncWriteExt;
        match stream_name {
            "stdout" => tokio::io::stdout().write_all(data).await.map_err(|e| StorageError::Backend(e.into())),
            "stderr" => tokio::io::stderr().write_all(data).await.map_err(|e| StorageError::Backend(e.into())),
            other => Err(StorageError::UnsupportedArtifact {
                node_id: node_id.to_string(),
                stream: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;

    #[tokio::test]
    async fn noop_db_service_accepts_every_call() {
        let db = NoopDbService;
        let wf = Workflow::new("wf", Node::new("root")).unwrap();
        assert!(db.add_workflow(&wf).await.is_ok());
        assert!(db.start_execution(wf.id(), "1").await.is_ok());
        assert!(db.end_execution(wf.id(), "1", ResultCode::Success).await.is_ok());
    }

    #[tokio::test]
    async fn noop_storage_rejects_unknown_stream() {
        let storage = NoopStorageService;
        let err = storage
            .append_to_artifact(Uuid::new_v4(), "1", "combined", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedArtifact { .. }));
    }
}
