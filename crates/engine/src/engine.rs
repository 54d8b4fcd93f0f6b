//! `Engine` — the entry point that ties a [`Workflow`] to a configured
//! [`NodeExecutor`] and runs it to completion.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::executor::NodeExecutor;
use crate::models::{RunConfig, Workflow};
use crate::service::{DbService, NoopDbService, NoopStorageService, StorageService};

pub struct Engine {
    db: Arc<dyn DbService>,
    storage: Arc<dyn StorageService>,
    config: RunConfig,
}

impl Engine {
    pub fn new(db: Arc<dyn DbService>, storage: Arc<dyn StorageService>, config: RunConfig) -> Self {
        Self { db, storage, config }
    }

    /// Run a [`Workflow`] through to completion, returning the process exit
    /// code the out-of-scope CLI/authoring layer should surface: `0` on
    /// success, `1` on any failure at the root.
    pub async fn run(&self, workflow: &Workflow) -> Result<i32, EngineError> {
        self.db
            .add_workflow(workflow)
            .await
            .map_err(EngineError::Database)?;

        tracing::info!(workflow = %workflow.name(), id = %workflow.id(), "starting workflow run");

        let executor = NodeExecutor::new(Arc::clone(&self.db), Arc::clone(&self.storage), self.config.clone());
        let outcome = executor
            .execute_node(workflow.id(), workflow.root(), CancellationToken::new())
            .await;

        tracing::info!(workflow = %workflow.name(), outcome = %outcome, "workflow run finished");

        Ok(outcome.process_exit_code())
    }
}

impl Default for Engine {
    /// An engine with no persistence and no artifact storage, suitable for
    /// tests and ad hoc local runs.
    fn default() -> Self {
        Self::new(Arc::new(NoopDbService), Arc::new(NoopStorageService), RunConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, ResultCode};
    use nodes::Executable;

    #[tokio::test]
    async fn run_returns_zero_on_success() {
        let root = Node::new("root").with_executable(Executable::Command { cmd: "exit 0".into(), timeout: None });
        let wf = Workflow::new("wf", root).unwrap();
        let code = Engine::default().run(&wf).await.unwrap();
        assert_eq!(code, 0);
        assert_eq!(wf.root().result().unwrap().outcome, ResultCode::Success);
    }

    #[tokio::test]
    async fn run_returns_one_on_failure() {
        let root = Node::new("root").with_executable(Executable::Command { cmd: "exit 1".into(), timeout: None });
        let wf = Workflow::new("wf", root).unwrap();
        let code = Engine::default().run(&wf).await.unwrap();
        assert_eq!(code, 1);
    }
}
