//! `NodeExecutor` — drives one node (and recursively its children) to a
//! final [`ResultCode`], streaming captured output into the configured
//! [`StorageService`] and bookkeeping into the configured [`DbService`]
//! along the way.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use nodes::{exit_code, Executable, ProcessRunner, WaitOutcome};

use crate::models::{Node, NodeResult, ResultCode, RunConfig};
use crate::service::{DbService, StorageService};

/// How much of a stream to buffer before forwarding it to storage. Smaller
/// than a pipe buffer so partial output is flushed promptly rather than
/// held back waiting for a full chunk.
const READ_CHUNK_SIZE: usize = 4096;

pub struct NodeExecutor {
    db: Arc<dyn DbService>,
    storage: Arc<dyn StorageService>,
    config: RunConfig,
}

impl NodeExecutor {
    pub fn new(db: Arc<dyn DbService>, storage: Arc<dyn StorageService>, config: RunConfig) -> Self {
        Self { db, storage, config }
    }

    /// Execute `node` and its subtree, returning the final result code.
    ///
    /// Boxed because it recurses through [`Self::execute_children`] into
    /// itself for every child — an `async fn` cannot call itself directly
    /// since that would require an infinitely-sized future.
    pub fn execute_node<'a>(
        &'a self,
        workflow_id: Uuid,
        node: &'a Node,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ResultCode> + Send + 'a>> {
        Box::pin(async move {
            if let Err(e) = self.db.start_execution(workflow_id, node.id()).await {
                tracing::warn!(node = node.id(), error = %e, "start_execution failed");
            }

            let outcome = self.run_node_body(workflow_id, node, cancel).await;

            if let Err(e) = self.db.end_execution(workflow_id, node.id(), outcome).await {
                tracing::warn!(node = node.id(), error = %e, "end_execution failed");
            }

            outcome
        })
    }

    async fn run_node_body(&self, workflow_id: Uuid, node: &Node, cancel: CancellationToken) -> ResultCode {
        // A node's own executable (if any) runs first; per spec §4.4-4.5 its
        // children still run afterwards unless the executable itself failed
        // and `ignore_failure` is off — mirroring a plain sequential child
        // whose own step fails.
        let mut result = match node.executable() {
            Some(executable) => self.run_executable(workflow_id, node, executable, cancel.clone()).await,
            None => NodeResult {
                outcome: ResultCode::Success,
                retcode: None,
                stdout: Vec::new(),
                stderr: Vec::new(),
            },
        };

        let own_failed = !result.outcome.is_success();
        if node.children().is_empty() || (own_failed && !self.config.ignore_failure) {
            let outcome = result.outcome;
            node.set_result(result);
            return outcome;
        }

        let children_outcome = self.execute_children(workflow_id, node, cancel).await;
        if !own_failed && !children_outcome.is_success() {
            result.outcome = ResultCode::ChildFailed;
        }
        let outcome = result.outcome;
        node.set_result(result);
        outcome
    }

    async fn execute_children(&self, workflow_id: Uuid, node: &Node, cancel: CancellationToken) -> ResultCode {
        if node.parallel() {
            self.execute_children_parallel(workflow_id, node, cancel).await
        } else {
            self.execute_children_sequential(workflow_id, node, cancel).await
        }
    }

    async fn execute_children_sequential(
        &self,
        workflow_id: Uuid,
        node: &Node,
        cancel: CancellationToken,
    ) -> ResultCode {
        let mut any_failed = false;
        for child in node.children() {
            let child_token = cancel.child_token();
            let outcome = self.execute_node(workflow_id, child, child_token).await;
            if !outcome.is_success() {
                any_failed = true;
                if !self.config.ignore_failure {
                    break;
                }
            }
        }
        if any_failed {
            ResultCode::ChildFailed
        } else {
            ResultCode::Success
        }
    }

    async fn execute_children_parallel(
        &self,
        workflow_id: Uuid,
        node: &Node,
        cancel: CancellationToken,
    ) -> ResultCode {
        let children = node.children();
        let mut futures = FuturesUnordered::new();
        let tokens: Vec<CancellationToken> = children.iter().map(|_| cancel.child_token()).collect();

        for (child, token) in children.iter().zip(tokens.iter()) {
            futures.push(self.execute_node(workflow_id, child, token.clone()));
        }

        let mut any_failed = false;
        while let Some(outcome) = futures.next().await {
            if !outcome.is_success() {
                any_failed = true;
                if !self.config.ignore_failure {
                    // Cancel every sibling still running; finished ones are
                    // unaffected since their futures have already resolved.
                    for token in &tokens {
                        token.cancel();
                    }
                }
            }
        }

        if any_failed {
            ResultCode::ChildFailed
        } else {
            ResultCode::Success
        }
    }

    /// Spawn `executable`, stream its output concurrently with waiting on
    /// it, and resolve to a [`NodeResult`] reflecting how it ended.
    async fn run_executable(
        &self,
        workflow_id: Uuid,
        node: &Node,
        executable: &Executable,
        cancel: CancellationToken,
    ) -> NodeResult {
        let (mut runner, stdout, stderr) = match ProcessRunner::start(executable) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(node = node.id(), error = %e, "failed to spawn process");
                return NodeResult {
                    outcome: ResultCode::Fail,
                    retcode: None,
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                };
            }
        };

        let node_id = node.id().to_string();
        let storage = Arc::clone(&self.storage);
        let stdout_task = tokio::spawn(read_stream(storage.clone(), workflow_id, node_id.clone(), "stdout", stdout));
        let stderr_task = tokio::spawn(read_stream(storage, workflow_id, node_id, "stderr", stderr));

        let wait_outcome = tokio::select! {
            outcome = runner.wait(executable.timeout()) => outcome,
            _ = cancel.cancelled() => WaitOutcome::TimedOut,
        };

        let was_cancelled = cancel.is_cancelled();

        let (outcome, retcode) = match wait_outcome {
            WaitOutcome::Exited(status) => {
                let code = exit_code(&status);
                let ok = code == Some(0);
                (if ok { ResultCode::Success } else { ResultCode::Fail }, code)
            }
            WaitOutcome::TimedOut => {
                let final_status = runner.terminate().await;
                let code = final_status.as_ref().and_then(exit_code);
                let outcome = if was_cancelled {
                    ResultCode::Cancelled
                } else {
                    ResultCode::Timeout
                };
                (outcome, code)
            }
            WaitOutcome::Error(e) => {
                tracing::error!(node = %node.id(), error = %e, "error waiting on process, terminating to reap it");
                let final_status = runner.terminate().await;
                let code = final_status.as_ref().and_then(exit_code);
                (ResultCode::Fail, code)
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        NodeResult {
            outcome,
            retcode,
            stdout,
            stderr,
        }
    }
}

/// Read `stream` to EOF in fixed-size chunks, forwarding every chunk to
/// storage as it arrives and accumulating the full byte sequence to return.
/// Reading (rather than waiting for the whole stream up front) lets this
/// run concurrently with `wait()` without deadlocking on a full pipe buffer.
async fn read_stream<R: tokio::io::AsyncRead + Unpin>(
    storage: Arc<dyn StorageService>,
    workflow_id: Uuid,
    node_id: String,
    stream_name: &'static str,
    mut stream: R,
) -> Vec<u8> {
    let mut accumulated = Vec::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = &buf[..n];
                if let Err(e) = storage.append_to_artifact(workflow_id, &node_id, stream_name, chunk).await {
                    tracing::warn!(node = %node_id, stream = stream_name, error = %e, "failed to append artifact");
                }
                accumulated.extend_from_slice(chunk);
            }
            Err(e) => {
                tracing::warn!(node = %node_id, stream = stream_name, error = %e, "error reading stream");
                break;
            }
        }
    }
    accumulated
}
