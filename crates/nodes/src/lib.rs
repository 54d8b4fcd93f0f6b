//! `nodes` crate — the `Executable` data model and the `ProcessRunner`
//! process-supervision layer the engine drives per node.
//!
//! This crate knows nothing about trees, workflows, or persistence; it only
//! knows how to turn an [`Executable`] into a running child process with
//! captured stdio, and how to resolve `FunctionExec` targets in an isolated
//! child via [`registry`].

pub mod error;
pub mod executable;
pub mod process;
pub mod registry;

pub use error::ProcessError;
pub use executable::Executable;
pub use process::{exit_code, ProcessRunner, WaitOutcome};
