//! Dependency graph construction and execution ordering.
//!
//! A node depends on the source node of every connection that targets it.
//! The execution order is produced by a depth-first walk with three colors:
//! roots are taken in declared node order, dependencies in declared
//! connection order, and a node is emitted once all of its dependencies
//! have been emitted. Reaching a node that is still on the walk's path means
//! the graph has a cycle.

use maticore::{NodeId, Workflow, WorkflowError};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Edges point from the producing node to the consuming node.
pub struct DependencyGraph {
    graph: DiGraph<NodeId, ()>,
    node_to_index: HashMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph, rejecting duplicate node ids and connections whose
    /// endpoints are not nodes of the workflow.
    pub fn build(workflow: &Workflow) -> Result<Self, WorkflowError> {
        let mut graph = DiGraph::new();
        let mut node_to_index = HashMap::new();

        for node_spec in &workflow.nodes {
            if node_to_index.contains_key(&node_spec.id) {
                return Err(WorkflowError::DuplicateNodeId(node_spec.id.clone()));
            }
            let idx = graph.add_node(node_spec.id.clone());
            node_to_index.insert(node_spec.id.clone(), idx);
        }

        for conn in &workflow.connections {
            let from_idx = node_to_index
                .get(&conn.source_node)
                .ok_or_else(|| WorkflowError::NodeNotFound(conn.source_node.clone()))?;
            let to_idx = node_to_index
                .get(&conn.target_node)
                .ok_or_else(|| WorkflowError::NodeNotFound(conn.target_node.clone()))?;

            graph.add_edge(*from_idx, *to_idx, ());
        }

        Ok(Self {
            graph,
            node_to_index,
        })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Direct dependencies of `node_id`, in connection order, without repeats.
    pub fn dependencies(&self, node_id: &str) -> Vec<&NodeId> {
        match self.node_to_index.get(node_id) {
            Some(idx) => self
                .dependency_indices(*idx)
                .into_iter()
                .map(|dep| &self.graph[dep])
                .collect(),
            None => Vec::new(),
        }
    }

    fn dependency_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        // petgraph yields incoming edges newest first; edge indices follow
        // insertion order, so sort on them to recover the declared order.
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (edge.id(), edge.source()))
            .collect();
        edges.sort_by_key(|(edge_id, _)| *edge_id);

        let mut deps: Vec<NodeIndex> = Vec::with_capacity(edges.len());
        for (_, source) in edges {
            if !deps.contains(&source) {
                deps.push(source);
            }
        }
        deps
    }

    /// Linear execution order consistent with every dependency.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, WorkflowError> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());

        for root in self.graph.node_indices() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }

            // Each frame is a node plus the position of the next dependency
            // to visit.
            marks[root.index()] = Mark::InProgress;
            let mut stack = vec![(root, self.dependency_indices(root), 0usize)];

            while let Some((node, deps, next)) = stack.last_mut() {
                if let Some(&dep) = deps.get(*next) {
                    *next += 1;
                    match marks[dep.index()] {
                        Mark::Done => {}
                        Mark::InProgress => return Err(WorkflowError::CyclicDependency),
                        Mark::Unvisited => {
                            marks[dep.index()] = Mark::InProgress;
                            let dep_deps = self.dependency_indices(dep);
                            stack.push((dep, dep_deps, 0));
                        }
                    }
                } else {
                    let node = *node;
                    marks[node.index()] = Mark::Done;
                    order.push(self.graph[node].clone());
                    stack.pop();
                }
            }
        }

        Ok(order)
    }
}

/// Build the dependency graph for `workflow` and order it.
pub fn resolve_execution_order(workflow: &Workflow) -> Result<Vec<NodeId>, WorkflowError> {
    DependencyGraph::build(workflow)?.execution_order()
}
