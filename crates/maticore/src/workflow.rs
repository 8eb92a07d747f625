use crate::{NodeConfig, PortSpec, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WorkflowId = Uuid;
pub type NodeId = String;
pub type ConnectionId = String;

/// Complete workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default = "Uuid::new_v4")]
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Declared node order; the resolver walks nodes in this order.
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeSpec) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn connect(
        &mut self,
        source_node: impl Into<NodeId>,
        source_port: impl Into<String>,
        target_node: impl Into<NodeId>,
        target_port: impl Into<String>,
    ) -> ConnectionId {
        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            source_node: source_node.into(),
            source_port: source_port.into(),
            target_node: target_node.into(),
            target_port: target_port.into(),
        };
        let id = connection.id.clone();
        self.connections.push(connection);
        id
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Connections whose target is `node_id`, in declared order.
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.target_node == node_id)
    }
}

/// Node specification in a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: NodeConfig,
    /// Input ports the binder resolves before the node runs.
    #[serde(default)]
    pub input_ports: Vec<PortSpec>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            name: None,
            config: NodeConfig::new(),
            input_ports: Vec::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_input_port(mut self, port: PortSpec) -> Self {
        self.input_ports.push(port);
        self
    }

    pub fn with_input_ports(mut self, ports: impl IntoIterator<Item = PortSpec>) -> Self {
        self.input_ports.extend(ports);
        self
    }
}

/// Connection from one node's output port to another node's input port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub id: ConnectionId,
    pub source_node: NodeId,
    pub source_port: String,
    pub target_node: NodeId,
    pub target_port: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataType;

    #[test]
    fn workflow_round_trips_through_json() {
        let mut workflow = Workflow::new("tts");
        workflow.add_node(
            NodeSpec::new("gen", "text-generation")
                .with_config("model", "gpt-4")
                .with_input_port(PortSpec::new("prompt", DataType::String).with_default("hello")),
        );
        workflow.add_node(NodeSpec::new("speak", "text-to-speech"));
        workflow.connect("gen", "text", "speak", "text");

        let json = serde_json::to_string(&workflow).unwrap();
        let parsed: Workflow = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.nodes[0].input_ports[0].default_value, Some(Value::from("hello")));
        assert_eq!(parsed.incoming("speak").count(), 1);
        assert_eq!(parsed.incoming("gen").count(), 0);
    }
}
