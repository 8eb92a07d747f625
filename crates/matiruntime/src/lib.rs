//! Workflow execution runtime
//!
//! The node registry, dependency resolution, input binding, the run store
//! seam and the orchestrator that drives a run through its nodes one at a
//! time, plus the [`FlowRuntime`] facade that tracks active runs and their
//! cancellation tokens.

mod binder;
mod executor;
mod registry;
mod resolver;
mod runtime;
mod store;

pub use binder::bind_inputs;
pub use executor::WorkflowExecutor;
pub use registry::{NodeFactory, NodeMetadata, NodeRegistry};
pub use resolver::{resolve_execution_order, DependencyGraph};
pub use runtime::{FlowRuntime, RuntimeConfig};
pub use store::{InMemoryRunStore, RunStore};
