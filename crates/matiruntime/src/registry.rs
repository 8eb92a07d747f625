use maticore::{NodeError, NodeRunner, PortSpec, WorkflowError};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating runner instances
pub trait NodeFactory: Send + Sync {
    /// Create a fresh runner for one node execution
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError>;

    /// Optional: Get node metadata (description, ports, etc.)
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::default()
    }
}

impl<F> NodeFactory for F
where
    F: Fn() -> Box<dyn NodeRunner> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn NodeRunner>, NodeError> {
        Ok(self())
    }
}

/// Metadata about a node type
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub description: String,
    pub category: String,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// Registry of available node types
///
/// Populated once at startup, then shared as `Arc<NodeRegistry>`. Only `&self`
/// lookups are reachable through the `Arc`, so concurrent runs resolve
/// without locking.
pub struct NodeRegistry {
    factories: HashMap<String, Arc<dyn NodeFactory>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a node factory. Each type id may be registered once.
    pub fn register(
        &mut self,
        node_type: impl Into<String>,
        factory: Arc<dyn NodeFactory>,
    ) -> Result<(), WorkflowError> {
        let node_type = node_type.into();
        if self.factories.contains_key(&node_type) {
            return Err(WorkflowError::DuplicateNodeType(node_type));
        }
        tracing::debug!("Registering node type: {}", node_type);
        self.factories.insert(node_type, factory);
        Ok(())
    }

    pub fn resolve(&self, node_type: &str) -> Result<Arc<dyn NodeFactory>, WorkflowError> {
        self.factories
            .get(node_type)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownNodeType(node_type.to_string()))
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.factories.contains_key(node_type)
    }

    /// Get all registered node types, sorted
    pub fn list_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn metadata(&self, node_type: &str) -> Option<NodeMetadata> {
        self.factories.get(node_type).map(|f| f.metadata())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
