use crate::{NodeId, PortDirection, RunId, RunStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("node '{node_id}' failed: {source}")]
    Node {
        node_id: NodeId,
        #[source]
        source: NodeError,
    },

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Run store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown run: {0}")]
    UnknownRun(RunId),

    #[error("Run {0} is already active")]
    RunAlreadyActive(RunId),

    #[error("Run {run_id} cannot start from status {status}")]
    RunNotQueued { run_id: RunId, status: RunStatus },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by a runner or by the port checks it performs.
///
/// None of these are retried; the orchestrator fails the run on the first one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Required {direction} port '{port}' has no value")]
    MissingPort {
        port: String,
        direction: PortDirection,
    },

    #[error("Invalid type for {direction} port '{port}': expected {expected}, got {actual}")]
    InvalidType {
        port: String,
        direction: PortDirection,
        expected: String,
        actual: String,
    },

    #[error("Validation failed for {direction} port '{port}': {reason}")]
    Rejected {
        port: String,
        direction: PortDirection,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl NodeError {
    /// True for the port-level failures (missing, mistyped, rejected).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NodeError::MissingPort { .. } | NodeError::InvalidType { .. } | NodeError::Rejected { .. }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Invalid workflow: {0}")]
    Invalid(String),

    #[error("Workflow contains cycles")]
    CyclicDependency,

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Node type '{0}' is already registered")]
    DuplicateNodeType(String),

    #[error("No value provided for required input port '{port}' on node {node_id}")]
    InputBinding { node_id: NodeId, port: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Run not found: {0}")]
    RunNotFound(RunId),

    #[error("Run {0} is already finalized")]
    RunFinalized(RunId),

    #[error("Store backend error: {0}")]
    Backend(String),
}
