use crate::{
    events::EventEmitter, validate_ports, NodeError, NodeId, PortDirection, PortSpec, PortValues,
    RunId, Value,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Static configuration attached to a node in the workflow graph.
pub type NodeConfig = HashMap<String, Value>;

/// Core trait that every node runner implements
///
/// Runners own their port declarations and are expected to call
/// [`NodeRunner::validate_inputs`] before doing any work and
/// [`NodeRunner::validate_outputs`] before returning.
#[async_trait]
pub trait NodeRunner: Send + Sync {
    /// Unique type identifier (e.g., "text-generation")
    fn node_type(&self) -> &str;

    fn input_ports(&self) -> Vec<PortSpec> {
        Vec::new()
    }

    fn output_ports(&self) -> Vec<PortSpec> {
        Vec::new()
    }

    /// Execute the node and return a value for each output port.
    ///
    /// May suspend for as long as the work takes. The orchestrator does not
    /// preempt it; long-running runners should watch `ctx.cancellation`.
    async fn execute(
        &self,
        inputs: &PortValues,
        config: &NodeConfig,
        ctx: &NodeContext,
    ) -> Result<PortValues, NodeError>;

    fn validate_inputs(&self, inputs: &PortValues) -> Result<(), NodeError> {
        validate_ports(inputs, &self.input_ports(), PortDirection::Input)
    }

    fn validate_outputs(&self, outputs: &PortValues) -> Result<(), NodeError> {
        validate_ports(outputs, &self.output_ports(), PortDirection::Output)
    }
}

/// Execution context passed to each runner
#[derive(Clone)]
pub struct NodeContext {
    pub run_id: RunId,

    pub node_id: NodeId,

    /// Event emitter for real-time updates
    pub events: EventEmitter,

    /// Fires when the run is cancelled. Child of the run token, so a runner
    /// cannot cancel its own run through it.
    pub cancellation: CancellationToken,
}

impl NodeContext {
    pub fn new(
        run_id: RunId,
        node_id: impl Into<NodeId>,
        events: EventEmitter,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            run_id,
            node_id: node_id.into(),
            events,
            cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Get config value or return error
pub fn require_config<'a>(config: &'a NodeConfig, name: &str) -> Result<&'a Value, NodeError> {
    config
        .get(name)
        .ok_or_else(|| NodeError::Configuration(format!("Missing config: {}", name)))
}

/// Get a string input that `validate_inputs` has already checked.
pub fn input_str<'a>(inputs: &'a PortValues, name: &str) -> Result<&'a str, NodeError> {
    match inputs.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(NodeError::InvalidType {
            port: name.to_string(),
            direction: PortDirection::Input,
            expected: "string".to_string(),
            actual: other.type_name().to_string(),
        }),
        None => Err(NodeError::MissingPort {
            port: name.to_string(),
            direction: PortDirection::Input,
        }),
    }
}
