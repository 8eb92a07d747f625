use async_trait::async_trait;
use maticore::{DataType, NodeConfig, NodeContext, NodeError, NodeRunner, PortSpec, PortValues, Value};
use matiruntime::{NodeFactory, NodeMetadata};

/// Simple debug node that logs its inputs
pub struct DebugNode;

#[async_trait]
impl NodeRunner for DebugNode {
    fn node_type(&self) -> &str {
        "debug.log"
    }

    fn input_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new("message", DataType::String).optional()]
    }

    fn output_ports(&self) -> Vec<PortSpec> {
        vec![PortSpec::new("message", DataType::String)]
    }

    async fn execute(
        &self,
        inputs: &PortValues,
        _config: &NodeConfig,
        ctx: &NodeContext,
    ) -> Result<PortValues, NodeError> {
        self.validate_inputs(inputs)?;

        let message = inputs
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("(no message)");

        tracing::info!("[{}] DEBUG: {}", ctx.node_id, message);
        ctx.events.info(format!("DEBUG: {}", message));

        // Also log all inputs for visibility
        let mut keys: Vec<_> = inputs.keys().collect();
        keys.sort();
        for key in keys {
            ctx.events.info(format!("  {}: {:?}", key, inputs[key]));
        }

        let outputs = PortValues::from([("message".to_string(), Value::from(message))]);
        self.validate_outputs(&outputs)?;
        Ok(outputs)
    }
}

pub struct DebugNodeFactory;

impl NodeFactory for DebugNodeFactory {
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError> {
        Ok(Box::new(DebugNode))
    }

    fn metadata(&self) -> NodeMetadata {
        crate::spec_for("debug.log").map(NodeMetadata::from).unwrap_or_default()
    }
}
