//! `engine` crate — the tree-shaped workflow model, the node executor that
//! walks it, and the service interfaces it is driven through.

pub mod engine;
pub mod error;
pub mod executor;
pub mod models;
pub mod service;
pub mod tree;

pub use crate::engine::Engine;
pub use error::EngineError;
pub use executor::NodeExecutor;
pub use models::{Node, NodeResult, ResultCode, RunConfig, Workflow};
pub use service::{DbService, NoopDbService, NoopStorageService, StorageError, StorageService};
