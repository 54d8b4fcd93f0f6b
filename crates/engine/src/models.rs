//! Core domain models: the result-code lattice, the one-shot node result,
//! the node tree, and the workflow that owns it.

use std::sync::OnceLock;

use nodes::Executable;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ResultCode
// ---------------------------------------------------------------------------

/// The outcome of one node's (or subtree's) execution.
///
/// Any non-[`ResultCode::Success`] value is a failure for propagation
/// purposes; the numeric value is what a DB-backed `executions` row would
/// store in its `result_code` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success = 0,
    Fail = 1,
    ChildFailed = 2,
    Timeout = 3,
    Cancelled = 4,
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        matches!(self, ResultCode::Success)
    }

    /// The exit code the top-level `Engine::run` surfaces: `0` on success,
    /// `1` on any failure.
    pub fn process_exit_code(self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResultCode::Success => "SUCCESS",
            ResultCode::Fail => "FAIL",
            ResultCode::ChildFailed => "CHILD_FAILED",
            ResultCode::Timeout => "TIMEOUT",
            ResultCode::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// NodeResult
// ---------------------------------------------------------------------------

/// The result of running one node's own executable (or, for a grouping
/// node, a placeholder with no captured bytes).
///
/// `outcome` is tracked alongside `retcode` because it distinguishes
/// `TIMEOUT`/`CANCELLED`/`CHILD_FAILED` from a plain `FAIL`, none of which
/// are recoverable from `retcode` alone.
#[derive(Debug, Clone)]
pub struct NodeResult {
    pub outcome: ResultCode,
    pub retcode: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One vertex in a workflow tree.
///
/// `id`, `lft`, and `rgt` start unset and are assigned by a single
/// depth-first pass in [`Workflow::new`]; `result` is a one-shot cell the
/// owning executor writes to exactly once.
#[derive(Debug)]
pub struct Node {
    name: String,
    executable: Option<Executable>,
    parallel: bool,
    pub(crate) children: Vec<Node>,

    pub(crate) id: String,
    pub(crate) lft: u64,
    pub(crate) rgt: u64,

    result: OnceLock<NodeResult>,
}

impl Node {
    /// A pure grouping node: no executable, sequential by default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            executable: None,
            parallel: false,
            children: Vec::new(),
            id: String::new(),
            lft: 0,
            rgt: 0,
            result: OnceLock::new(),
        }
    }

    pub fn with_executable(mut self, executable: Executable) -> Self {
        self.executable = Some(executable);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executable(&self) -> Option<&Executable> {
        self.executable.as_ref()
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Stable identifier assigned at workflow construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `(lft, rgt)` nested-set interval assigned at workflow construction.
    pub fn interval(&self) -> (u64, u64) {
        (self.lft, self.rgt)
    }

    /// `true` iff `other`'s interval is strictly contained in `self`'s.
    pub fn contains(&self, other: &Node) -> bool {
        self.lft < other.lft && other.rgt < self.rgt
    }

    pub fn result(&self) -> Option<&NodeResult> {
        self.result.get()
    }

    /// Record this node's result. Called at most once per node per run;
    /// a second call is a programming error in the executor and is ignored
    /// rather than panicking, since `result` must remain structurally
    /// write-once.
    pub(crate) fn set_result(&self, result: NodeResult) {
        if self.result.set(result).is_err() {
            tracing::warn!(node = %self.name, "node result was already set; ignoring duplicate write");
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A named, root-owning workflow. Constructing one assigns every node a
/// stable id and nested-set interval via a single depth-first pass.
#[derive(Debug)]
pub struct Workflow {
    name: String,
    root: Node,
    id: Uuid,
}

impl Workflow {
    pub fn new(name: impl Into<String>, mut root: Node) -> Result<Self, crate::error::EngineError> {
        let mut counter: u64 = 0;
        crate::tree::assign_intervals(&mut root, &mut counter)?;
        Ok(Self {
            name: name.into(),
            root,
            id: Uuid::new_v4(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Tuning knobs the out-of-scope authoring/CLI layer populates before
/// constructing an [`crate::engine::Engine`].
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// When `false` (the default), a failing sequential child stops the
    /// rest of its siblings from dispatching, and a failing parallel
    /// sibling cancels the others. When `true`, every child still runs (or
    /// is already running) to completion regardless of its siblings.
    pub ignore_failure: bool,
}
