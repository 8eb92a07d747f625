//! Live state of a single workflow run.
//!
//! A run moves `queued -> running -> {completed | failed | cancelled}`. Once
//! a terminal status is reached every mutator on [`RunState`] is a no-op, so
//! recorded node states and results cannot change afterwards.

use crate::{NodeId, PortValues};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

pub type RunId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Per-node record kept while a run executes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub status: NodeStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub inputs: Option<PortValues>,
    pub outputs: Option<PortValues>,
    pub error: Option<String>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            status: NodeStatus::Pending,
            started_at: None,
            completed_at: None,
            inputs: None,
            outputs: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub node_id: Option<NodeId>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: RunId,
    pub status: RunStatus,
    /// Percentage of nodes completed, 0 to 100.
    pub progress: f64,
    pub current_node: Option<NodeId>,
    pub node_states: HashMap<NodeId, NodeState>,
    /// Outputs by node, read by the binder for downstream inputs.
    pub node_results: HashMap<NodeId, PortValues>,
    pub error: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub logs: Vec<LogEntry>,
}

impl RunState {
    /// A fresh `queued` run.
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            status: RunStatus::Queued,
            progress: 0.0,
            current_node: None,
            node_states: HashMap::new(),
            node_results: HashMap::new(),
            error: None,
            start_time: None,
            end_time: None,
            logs: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn node_status(&self, node_id: &str) -> Option<NodeStatus> {
        self.node_states.get(node_id).map(|s| s.status)
    }

    /// `queued -> running`, with progress and node maps reset.
    pub fn start(&mut self) {
        if self.status != RunStatus::Queued {
            return;
        }
        self.status = RunStatus::Running;
        self.progress = 0.0;
        self.current_node = None;
        self.node_states.clear();
        self.node_results.clear();
        self.error = None;
        self.start_time = Some(Utc::now());
    }

    pub fn node_started(&mut self, node_id: &str, inputs: PortValues) {
        if self.is_terminal() {
            return;
        }
        self.current_node = Some(node_id.to_string());
        self.node_states.insert(
            node_id.to_string(),
            NodeState {
                status: NodeStatus::Running,
                started_at: Some(Utc::now()),
                inputs: Some(inputs),
                ..NodeState::default()
            },
        );
    }

    pub fn node_completed(&mut self, node_id: &str, outputs: PortValues) {
        if self.is_terminal() {
            return;
        }
        let state = self.node_states.entry(node_id.to_string()).or_default();
        state.status = NodeStatus::Completed;
        state.completed_at = Some(Utc::now());
        state.outputs = Some(outputs.clone());
        self.node_results.insert(node_id.to_string(), outputs);
    }

    /// Record a node failure. Works for nodes that never reached `running`
    /// (unknown type, unbound input), in which case `started_at` stays empty.
    pub fn node_failed(&mut self, node_id: &str, error: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        let state = self.node_states.entry(node_id.to_string()).or_default();
        state.status = NodeStatus::Failed;
        state.completed_at = Some(Utc::now());
        state.error = Some(error.into());
    }

    pub fn set_progress(&mut self, completed: usize, total: usize) {
        if self.is_terminal() || total == 0 {
            return;
        }
        self.progress = completed as f64 / total as f64 * 100.0;
    }

    pub fn log(&mut self, level: LogLevel, node_id: Option<&str>, message: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.logs.push(LogEntry {
            timestamp: Utc::now(),
            level,
            node_id: node_id.map(str::to_string),
            message: message.into(),
        });
    }

    /// Move to a terminal status. Only the first call has any effect.
    pub fn finish(&mut self, status: RunStatus, error: Option<String>) {
        if self.is_terminal() || !status.is_terminal() {
            return;
        }
        self.status = status;
        self.error = error;
        self.current_node = None;
        self.end_time = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn outputs(value: i64) -> PortValues {
        PortValues::from([("out".to_string(), Value::Integer(value))])
    }

    #[test]
    fn lifecycle_reaches_exactly_one_terminal_state() {
        let mut state = RunState::new(Uuid::new_v4());
        assert_eq!(state.status, RunStatus::Queued);

        state.start();
        assert_eq!(state.status, RunStatus::Running);
        assert!(state.start_time.is_some());

        state.finish(RunStatus::Completed, None);
        state.finish(RunStatus::Failed, Some("late".into()));

        assert_eq!(state.status, RunStatus::Completed);
        assert!(state.error.is_none());
        assert!(state.end_time.is_some());
    }

    #[test]
    fn terminal_state_is_frozen() {
        let mut state = RunState::new(Uuid::new_v4());
        state.start();
        state.node_started("a", PortValues::new());
        state.node_completed("a", outputs(1));
        state.set_progress(1, 2);
        state.finish(RunStatus::Cancelled, None);

        let frozen = state.clone();
        state.node_started("b", PortValues::new());
        state.node_completed("a", outputs(2));
        state.node_failed("a", "nope");
        state.set_progress(2, 2);
        state.log(LogLevel::Info, None, "ignored");

        assert_eq!(state, frozen);
    }

    #[test]
    fn node_completion_stores_results_separately() {
        let mut state = RunState::new(Uuid::new_v4());
        state.start();
        state.node_started("a", PortValues::from([("x".to_string(), Value::from("in"))]));
        assert_eq!(state.current_node.as_deref(), Some("a"));
        assert_eq!(state.node_status("a"), Some(NodeStatus::Running));

        state.node_completed("a", outputs(7));
        let node = &state.node_states["a"];
        assert_eq!(node.status, NodeStatus::Completed);
        assert!(node.started_at.is_some() && node.completed_at.is_some());
        assert_eq!(node.outputs, Some(outputs(7)));
        assert_eq!(state.node_results["a"], outputs(7));
    }

    #[test]
    fn failed_node_without_start_has_no_start_time() {
        let mut state = RunState::new(Uuid::new_v4());
        state.start();
        state.node_failed("a", "unknown node type");
        let node = &state.node_states["a"];
        assert_eq!(node.status, NodeStatus::Failed);
        assert!(node.started_at.is_none());
        assert_eq!(node.error.as_deref(), Some("unknown node type"));
    }

    #[test]
    fn progress_is_a_percentage() {
        let mut state = RunState::new(Uuid::new_v4());
        state.start();
        state.set_progress(1, 4);
        assert_eq!(state.progress, 25.0);
        state.set_progress(4, 4);
        assert_eq!(state.progress, 100.0);
    }
}
