use crate::binder::bind_inputs;
use crate::registry::NodeRegistry;
use crate::resolver::resolve_execution_order;
use crate::store::RunStore;
use chrono::Utc;
use futures::FutureExt;
use maticore::{
    EventBus, ExecutionEvent, FlowError, LogLevel, NodeContext, NodeError, NodeRunner, NodeSpec,
    PortValues, RunId, RunState, RunStatus, Workflow, WorkflowError,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// How the node loop ended when no error was raised.
enum LoopExit {
    Exhausted,
    Cancelled,
}

/// Drives one run at a time through its execution order
///
/// Nodes run strictly one after another. Every state change is committed to
/// the [`RunStore`] before the next step and mirrored on the event bus.
#[derive(Clone)]
pub struct WorkflowExecutor {
    registry: Arc<NodeRegistry>,
    store: Arc<dyn RunStore>,
    event_bus: Arc<EventBus>,
}

impl WorkflowExecutor {
    pub fn new(registry: Arc<NodeRegistry>, store: Arc<dyn RunStore>, event_bus: Arc<EventBus>) -> Self {
        Self {
            registry,
            store,
            event_bus,
        }
    }

    /// Execute `workflow` as run `run_id` until it reaches a terminal status
    ///
    /// Returns an error only when the run record cannot be loaded or is not
    /// `queued`. Every later failure (cycles, unknown node types, unbound
    /// inputs, runner errors, store failures) is reported through the
    /// returned terminal state instead.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        run_id: RunId,
        cancel: CancellationToken,
    ) -> Result<RunState, FlowError> {
        let mut state = self.store.load(run_id)?;
        if state.status != RunStatus::Queued {
            return Err(FlowError::RunNotQueued {
                run_id,
                status: state.status,
            });
        }

        let start_time = Instant::now();
        tracing::info!("Starting run {} of workflow {}", run_id, workflow.id);

        let result = self.drive(workflow, &mut state, &cancel).await;

        let (status, error) = match result {
            Ok(LoopExit::Exhausted) if !cancel.is_cancelled() => (RunStatus::Completed, None),
            Ok(_) => {
                tracing::warn!("Run {} cancelled", run_id);
                state.log(LogLevel::Warning, None, "Run cancelled");
                (RunStatus::Cancelled, None)
            }
            Err(e) => {
                tracing::error!("Run {} failed: {}", run_id, e);
                state.log(LogLevel::Error, None, e.to_string());
                (RunStatus::Failed, Some(e.to_string()))
            }
        };

        state.finish(status, error.clone());
        if let Err(e) = self.store.commit(&state) {
            tracing::error!("Failed to commit final state of run {}: {}", run_id, e);
        }

        let duration_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!("Run {} finished as {} in {}ms", run_id, status, duration_ms);
        self.event_bus.emit(ExecutionEvent::RunFinished {
            run_id,
            status,
            error,
            duration_ms,
            timestamp: Utc::now(),
        });

        Ok(state)
    }

    /// Start the run and walk the order. Node-attributable failures are
    /// recorded on the node before the error is returned.
    async fn drive(
        &self,
        workflow: &Workflow,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<LoopExit, FlowError> {
        let run_id = state.run_id;

        state.start();
        state.log(LogLevel::Info, None, "Run started");
        self.store.commit(state)?;
        self.event_bus.emit(ExecutionEvent::RunStarted {
            run_id,
            workflow_id: workflow.id,
            total_nodes: workflow.nodes.len(),
            timestamp: Utc::now(),
        });

        let order = resolve_execution_order(workflow)?;
        tracing::debug!("Run {} execution order: {:?}", run_id, order);

        let total = order.len();
        let mut completed = 0usize;

        for node_id in &order {
            if cancel.is_cancelled() {
                return Ok(LoopExit::Cancelled);
            }

            let node_spec = workflow
                .find_node(node_id)
                .ok_or_else(|| WorkflowError::NodeNotFound(node_id.clone()))?;

            let runner = match self.instantiate(node_spec) {
                Ok(runner) => runner,
                Err(e) => return Err(self.fail_node(state, node_id, e)),
            };

            let inputs = match bind_inputs(node_spec, &workflow.connections, &state.node_results) {
                Ok(inputs) => inputs,
                Err(e) => return Err(self.fail_node(state, node_id, e.into())),
            };

            state.node_started(node_id, inputs.clone());
            state.log(LogLevel::Info, Some(node_id.as_str()), format!("Executing {}", node_spec.node_type));
            // A run must not end with a node left `running`.
            if let Err(e) = self.store.commit(state) {
                return Err(self.fail_node(state, node_id, e.into()));
            }
            self.event_bus.emit(ExecutionEvent::NodeStarted {
                run_id,
                node_id: node_id.clone(),
                node_type: node_spec.node_type.clone(),
                timestamp: Utc::now(),
            });

            let ctx = NodeContext::new(
                run_id,
                node_id.clone(),
                self.event_bus.create_emitter(run_id, node_id.clone()),
                cancel.child_token(),
            );

            let started = Instant::now();
            let outputs = match invoke(runner.as_ref(), &inputs, node_spec, &ctx).await {
                Ok(outputs) => outputs,
                Err(source) => {
                    let e = FlowError::Node {
                        node_id: node_id.clone(),
                        source,
                    };
                    return Err(self.fail_node(state, node_id, e));
                }
            };
            let duration_ms = started.elapsed().as_millis() as u64;

            tracing::info!("Node {} completed in {}ms", node_id, duration_ms);
            state.node_completed(node_id, outputs.clone());
            state.log(LogLevel::Info, Some(node_id.as_str()), "Completed");

            completed += 1;
            state.set_progress(completed, total);
            self.store.commit(state)?;

            self.event_bus.emit(ExecutionEvent::NodeCompleted {
                run_id,
                node_id: node_id.clone(),
                outputs,
                duration_ms,
                timestamp: Utc::now(),
            });
            self.event_bus.emit(ExecutionEvent::Progress {
                run_id,
                progress: state.progress,
                timestamp: Utc::now(),
            });
        }

        Ok(LoopExit::Exhausted)
    }

    fn instantiate(&self, node_spec: &NodeSpec) -> Result<Box<dyn NodeRunner>, FlowError> {
        let factory = self.registry.resolve(&node_spec.node_type)?;
        factory.create().map_err(|source| FlowError::Node {
            node_id: node_spec.id.clone(),
            source,
        })
    }

    /// Mark the node failed and hand the error back for the run.
    fn fail_node(&self, state: &mut RunState, node_id: &str, error: FlowError) -> FlowError {
        let message = match &error {
            FlowError::Node { source, .. } => source.to_string(),
            FlowError::Workflow(source) => source.to_string(),
            other => other.to_string(),
        };
        tracing::error!("Node {} failed: {}", node_id, message);

        state.node_failed(node_id, message.clone());
        state.log(LogLevel::Error, Some(node_id), message.clone());

        self.event_bus.emit(ExecutionEvent::NodeFailed {
            run_id: state.run_id,
            node_id: node_id.to_string(),
            error: message,
            timestamp: Utc::now(),
        });
        error
    }
}

/// Run the runner, turning a panic into an execution failure.
async fn invoke(
    runner: &dyn NodeRunner,
    inputs: &PortValues,
    node_spec: &NodeSpec,
    ctx: &NodeContext,
) -> Result<PortValues, NodeError> {
    AssertUnwindSafe(runner.execute(inputs, &node_spec.config, ctx))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(NodeError::ExecutionFailed(format!("runner panicked: {}", reason)))
        })
}
