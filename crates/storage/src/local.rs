//! `LocalStorageService` — appends captured stream bytes to
//! `base_dir/workflow_id/node_id/stream_name.txt`, one file per artifact.
//!
//! Writes to the same file are serialized through a per-path lock so
//! concurrent stdout/stderr readers (or concurrent sibling nodes sharing a
//! base directory) never interleave partial writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use engine::{StorageError, StorageService};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct LocalStorageService {
    base_dir: PathBuf,
    handles: Mutex<HashMap<PathBuf, Arc<Mutex<File>>>>,
}

impl LocalStorageService {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn artifact_path(&self, workflow_id: Uuid, node_id: &str, stream_name: &str) -> PathBuf {
        self.base_dir
            .join(workflow_id.to_string())
            .join(node_id)
            .join(format!("{stream_name}.txt"))
    }

    async fn handle_for(&self, path: &Path) -> Result<Arc<Mutex<File>>, StorageError> {
        let mut handles = self.handles.lock().await;
        if let Some(existing) = handles.get(path) {
            return Ok(Arc::clone(existing));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Backend(e.into()))?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| StorageError::Backend(e.into()))?;

        let handle = Arc::new(Mutex::new(file));
        handles.insert(path.to_path_buf(), Arc::clone(&handle));
        Ok(handle)
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn append_to_artifact(
        &self,
        workflow_id: Uuid,
        node_id: &str,
        stream_name: &str,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let path = self.artifact_path(workflow_id, node_id, stream_name);
        let handle = self.handle_for(&path).await?;
        let mut file = handle.lock().await;
        file.write_all(data).await.map_err(|e| StorageError::Backend(e.into()))?;
        file.flush().await.map_err(|e| StorageError::Backend(e.into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_are_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let svc = LocalStorageService::new(dir.path());
        let workflow_id = Uuid::new_v4();

        svc.append_to_artifact(workflow_id, "node-1", "stdout", b"one\n").await.unwrap();
        svc.append_to_artifact(workflow_id, "node-1", "stdout", b"two\n").await.unwrap();

        let path = dir.path().join(workflow_id.to_string()).join("node-1").join("stdout.txt");
        let contents = tokio::fs::read(path).await.unwrap();
        assert_eq!(contents, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn separate_streams_go_to_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let svc = LocalStorageService::new(dir.path());
        let workflow_id = Uuid::new_v4();

        svc.append_to_artifact(workflow_id, "node-1", "stdout", b"out").await.unwrap();
        svc.append_to_artifact(workflow_id, "node-1", "stderr", b"err").await.unwrap();

        let out = tokio::fs::read(dir.path().join(workflow_id.to_string()).join("node-1").join("stdout.txt")).await.unwrap();
        let err = tokio::fs::read(dir.path().join(workflow_id.to_string()).join("node-1").join("stderr.txt")).await.unwrap();
        assert_eq!(out, b"out");
        assert_eq!(err, b"err");
    }
}
