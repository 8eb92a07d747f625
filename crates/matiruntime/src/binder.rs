use maticore::{Connection, NodeId, NodeSpec, PortValues, WorkflowError};
use std::collections::HashMap;

/// Resolve every declared input port of `node` to a value.
///
/// Per port: the value recorded for the connected source port, else the
/// declared default, else an error when the port is required. Optional ports
/// with nothing to bind are left out of the mapping. When several
/// connections target one port the last one declared wins; connections to
/// undeclared ports are ignored.
pub fn bind_inputs(
    node: &NodeSpec,
    connections: &[Connection],
    node_results: &HashMap<NodeId, PortValues>,
) -> Result<PortValues, WorkflowError> {
    let incoming: HashMap<&str, &Connection> = connections
        .iter()
        .filter(|conn| conn.target_node == node.id)
        .map(|conn| (conn.target_port.as_str(), conn))
        .collect();

    let mut inputs = PortValues::new();

    for port in &node.input_ports {
        let connected = incoming.get(port.name.as_str()).and_then(|conn| {
            node_results
                .get(&conn.source_node)
                .and_then(|outputs| outputs.get(&conn.source_port))
        });

        if let Some(value) = connected {
            inputs.insert(port.name.clone(), value.clone());
        } else if let Some(default) = &port.default_value {
            inputs.insert(port.name.clone(), default.clone());
        } else if port.required {
            return Err(WorkflowError::InputBinding {
                node_id: node.id.clone(),
                port: port.name.clone(),
            });
        }
    }

    Ok(inputs)
}
