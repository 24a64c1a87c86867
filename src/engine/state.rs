// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::graph::{Edge, GraphNode, WorkingSet};
use crate::traits::RunHandle;

/// Status of one graph node within a run.
///
/// `Success` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Idle => "idle",
            NodeStatus::Running => "running",
            NodeStatus::Success => "success",
            NodeStatus::Error => "error",
        }
    }
}

impl Display for NodeStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

impl RunStatus {
    /// `error` if any node errored, `success` if all succeeded, `idle` if
    /// nothing has started, `running` otherwise.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = NodeStatus>,
    {
        let mut seen = false;
        let mut all_success = true;
        let mut all_idle = true;
        for status in statuses {
            seen = true;
            match status {
                NodeStatus::Error => return RunStatus::Error,
                NodeStatus::Success => all_idle = false,
                NodeStatus::Running => {
                    all_success = false;
                    all_idle = false;
                }
                NodeStatus::Idle => all_success = false,
            }
        }

        match (seen, all_success, all_idle) {
            (false, _, _) => RunStatus::Idle,
            (true, true, _) => RunStatus::Success,
            (true, false, true) => RunStatus::Idle,
            (true, false, false) => RunStatus::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRunState {
    pub status: NodeStatus,
    pub message: String,
}

/// One submitted (or rejected) execution of a working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: String,
    pub user_id: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
    /// Set once the engine accepted the DAG
    pub engine_handle: Option<RunHandle>,
    pub status: RunStatus,
    pub node_status: IndexMap<String, NodeRunState>,
}

impl WorkflowRun {
    /// A fresh run with every node `idle`.
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, working: &WorkingSet) -> Self {
        let nodes: Vec<GraphNode> = working.nodes.values().cloned().collect();
        let node_status = nodes
            .iter()
            .map(|node| (node.id.clone(), NodeRunState::default()))
            .collect();

        Self {
            id: id.into(),
            user_id: user_id.into(),
            nodes,
            edges: working.edges(),
            engine_handle: None,
            status: RunStatus::Idle,
            node_status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
