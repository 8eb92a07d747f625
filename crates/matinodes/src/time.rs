use async_trait::async_trait;
use maticore::{NodeConfig, NodeContext, NodeError, NodeRunner, PortValues, Value};
use matiruntime::{NodeFactory, NodeMetadata};
use tokio::time::{sleep, Duration};

const DEFAULT_DELAY_MS: u64 = 1000;

/// Delay execution for a specified duration
///
/// Returns early, with its inputs, once the run is cancelled.
pub struct DelayNode;

impl DelayNode {
    fn delay_ms(config: &NodeConfig) -> Result<u64, NodeError> {
        match config.get("delay_ms") {
            None | Some(Value::Null) => Ok(DEFAULT_DELAY_MS),
            Some(value) => value
                .as_i64()
                .and_then(|ms| u64::try_from(ms).ok())
                .ok_or_else(|| {
                    NodeError::Configuration(format!(
                        "delay_ms must be a non-negative integer, got {}",
                        value.type_name()
                    ))
                }),
        }
    }
}

#[async_trait]
impl NodeRunner for DelayNode {
    fn node_type(&self) -> &str {
        "time.delay"
    }

    async fn execute(
        &self,
        inputs: &PortValues,
        config: &NodeConfig,
        ctx: &NodeContext,
    ) -> Result<PortValues, NodeError> {
        self.validate_inputs(inputs)?;
        let delay_ms = Self::delay_ms(config)?;

        ctx.events.info(format!("Delaying for {}ms", delay_ms));

        tokio::select! {
            _ = sleep(Duration::from_millis(delay_ms)) => {}
            _ = ctx.cancellation.cancelled() => {
                ctx.events.warn("Delay interrupted by cancellation");
            }
        }

        // Pass through any inputs
        let outputs = inputs.clone();
        self.validate_outputs(&outputs)?;
        Ok(outputs)
    }
}

pub struct DelayNodeFactory;

impl NodeFactory for DelayNodeFactory {
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError> {
        Ok(Box::new(DelayNode))
    }

    fn metadata(&self) -> NodeMetadata {
        crate::spec_for("time.delay").map(NodeMetadata::from).unwrap_or_default()
    }
}
