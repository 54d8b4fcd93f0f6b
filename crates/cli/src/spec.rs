//! JSON authoring format for workflow definitions fed to `validate`/`run`.
//!
//! This is a thin convenience for the demonstration CLI, not the rich
//! authoring layer the core engine is deliberately silent on — it exists
//! only so a user can hand this binary a file instead of constructing a
//! `Workflow` in Rust.

use engine::{Node, Workflow};
use nodes::Executable;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    #[serde(default)]
    pub executable: Option<Executable>,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    pub root: NodeSpec,
}

impl From<NodeSpec> for Node {
    fn from(spec: NodeSpec) -> Self {
        let mut node = Node::new(spec.name).with_parallel(spec.parallel);
        if let Some(executable) = spec.executable {
            node = node.with_executable(executable);
        }
        node.with_children(spec.children.into_iter().map(Node::from).collect())
    }
}

impl WorkflowSpec {
    pub fn into_workflow(self) -> Result<Workflow, engine::EngineError> {
        Workflow::new(self.name, self.root.into())
    }
}

/// Count every node in the tree, for the `validate` summary line.
pub fn count_nodes(node: &Node) -> usize {
    1 + node.children().iter().map(count_nodes).sum::<usize>()
}
