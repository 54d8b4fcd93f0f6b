use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid workflow tree: {reason}")]
    InvalidTree { reason: String },

    #[error("database operation failed: {0}")]
    Database(#[source] anyhow::Error),
}
