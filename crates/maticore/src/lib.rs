//! Core abstractions for the mati workflow engine
//!
//! Values, port specifications, the node runner contract, workflow graphs,
//! run state and the error taxonomy. Everything the runtime and the node
//! library share lives here.

mod error;
pub mod events;
mod node;
mod port;
mod run;
mod value;
mod workflow;

pub use error::{FlowError, NodeError, StoreError, WorkflowError};
pub use events::*;
pub use node::{input_str, require_config, NodeConfig, NodeContext, NodeRunner};
pub use port::{validate_ports, DataType, PortDirection, PortSpec, Validator};
pub use run::{LogEntry, LogLevel, NodeState, NodeStatus, RunId, RunState, RunStatus};
pub use value::{PortValues, Value};
pub use workflow::{Connection, ConnectionId, NodeId, NodeSpec, Workflow, WorkflowId};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
