//! Shared fixtures for the runtime integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use maticore::{
    DataType, NodeConfig, NodeContext, NodeError, NodeRunner, NodeSpec, PortSpec, PortValues,
    RunId, RunState, StoreError, Value, Workflow,
};
use matiruntime::{FlowRuntime, InMemoryRunStore, NodeFactory, NodeRegistry, RunStore, RuntimeConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// What a [`MockRunner`] does when executed.
#[derive(Clone)]
pub enum Behaviour {
    /// Return these outputs.
    Return(PortValues),
    /// Return the received inputs as outputs.
    Echo,
    /// Fail with this error.
    Fail(NodeError),
    /// Panic with this message.
    Panic(&'static str),
    /// Report on the channel, wait for the run to be cancelled, then succeed.
    BlockUntilCancelled(mpsc::UnboundedSender<()>),
}

/// Scripted runner that records every input mapping it receives.
#[derive(Clone)]
pub struct MockRunner {
    pub node_type: String,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub behaviour: Behaviour,
    pub calls: Arc<Mutex<Vec<PortValues>>>,
}

impl MockRunner {
    pub fn new(node_type: impl Into<String>, behaviour: Behaviour) -> Self {
        Self {
            node_type: node_type.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Succeeds with `{"out": value}` and declares `out` as an integer port.
    pub fn returning(node_type: impl Into<String>, value: i64) -> Self {
        let mut runner = Self::new(node_type, Behaviour::Return(outputs(&[("out", Value::Integer(value))])));
        runner.outputs.push(PortSpec::new("out", DataType::Integer));
        runner
    }

    pub fn with_input(mut self, port: PortSpec) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: PortSpec) -> Self {
        self.outputs.push(port);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<PortValues> {
        self.calls.lock().unwrap().clone()
    }

    pub fn factory(&self) -> Arc<dyn NodeFactory> {
        let runner = self.clone();
        Arc::new(move || Box::new(runner.clone()) as Box<dyn NodeRunner>)
    }
}

#[async_trait]
impl NodeRunner for MockRunner {
    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn input_ports(&self) -> Vec<PortSpec> {
        self.inputs.clone()
    }

    fn output_ports(&self) -> Vec<PortSpec> {
        self.outputs.clone()
    }

    async fn execute(
        &self,
        inputs: &PortValues,
        _config: &NodeConfig,
        ctx: &NodeContext,
    ) -> Result<PortValues, NodeError> {
        self.calls.lock().unwrap().push(inputs.clone());
        self.validate_inputs(inputs)?;

        let outputs = match &self.behaviour {
            Behaviour::Return(outputs) => outputs.clone(),
            Behaviour::Echo => inputs.clone(),
            Behaviour::Fail(e) => return Err(e.clone()),
            Behaviour::Panic(msg) => panic!("{}", msg),
            Behaviour::BlockUntilCancelled(started) => {
                let _ = started.send(());
                ctx.cancellation.cancelled().await;
                PortValues::new()
            }
        };

        self.validate_outputs(&outputs)?;
        Ok(outputs)
    }
}

pub fn outputs(pairs: &[(&str, Value)]) -> PortValues {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// Wraps the in-memory store and keeps a copy of every committed snapshot.
///
/// Can be told to reject one commit, counted from 1 across all runs.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: InMemoryRunStore,
    pub commits: Mutex<Vec<RunState>>,
    attempts: AtomicUsize,
    fail_at: AtomicUsize,
}

impl RecordingStore {
    pub fn snapshots(&self) -> Vec<RunState> {
        self.commits.lock().unwrap().clone()
    }

    pub fn fail_commit(&self, attempt: usize) {
        self.fail_at.store(attempt, Ordering::SeqCst);
    }
}

impl RunStore for RecordingStore {
    fn load(&self, run_id: RunId) -> Result<RunState, StoreError> {
        self.inner.load(run_id)
    }

    fn commit(&self, state: &RunState) -> Result<(), StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_at.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("transient".to_string()));
        }
        self.inner.commit(state)?;
        self.commits.lock().unwrap().push(state.clone());
        Ok(())
    }
}

/// Registry, store and runtime wired together around a set of mock runners.
pub struct Harness {
    pub store: Arc<RecordingStore>,
    pub runtime: FlowRuntime,
}

impl Harness {
    pub fn new(runners: &[&MockRunner]) -> Self {
        init_tracing();
        let mut registry = NodeRegistry::new();
        for runner in runners {
            registry
                .register(runner.node_type.clone(), runner.factory())
                .expect("unique node types");
        }

        let store = Arc::new(RecordingStore::default());
        let runtime = FlowRuntime::new(Arc::new(registry), store.clone(), RuntimeConfig::default());
        Self { store, runtime }
    }

    pub fn queue_run(&self) -> RunId {
        self.store.inner.create_run().run_id
    }

    pub async fn run(&self, workflow: &Workflow) -> RunState {
        let run_id = self.queue_run();
        self.runtime.start(workflow, run_id).await.expect("run starts")
    }
}

/// `ids[0] -> ids[1] -> ...`, each node of type `id`, wired `out -> in`.
///
/// Every node except the first declares a required integer `in` port.
pub fn chain(ids: &[&str]) -> Workflow {
    let mut wf = Workflow::new("chain");
    for (i, id) in ids.iter().enumerate() {
        let mut node = NodeSpec::new(*id, *id);
        if i > 0 {
            node = node.with_input_port(PortSpec::new("in", DataType::Integer));
        }
        wf.add_node(node);
    }
    for pair in ids.windows(2) {
        wf.connect(pair[0], "out", pair[1], "in");
    }
    wf
}
