// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-run status aggregation.
//!
//! [`RunAggregator`] is the pure half of a watcher: it turns one poll's worth
//! of engine phases into the node transitions that have to be emitted. It
//! owns the last-emitted status of every node, which gives three guarantees:
//!
//! * a status is emitted only when it differs from the last one emitted
//! * `success` and `error` are absorbing
//! * after the first failure every other unfinished node is failed exactly once

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::engine::{NodeStatus, Phase, RunStatus};

pub const UPSTREAM_FAILURE: &str = "upstream failure";
pub const POLL_TIMEOUT: &str = "poll timeout";
pub const CANCELLED: &str = "cancelled";

/// One node transition to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub node_id: String,
    pub status: NodeStatus,
    pub message: String,
}

/// Result of folding one poll into the aggregator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub updates: Vec<StatusUpdate>,
    /// Nodes whose own tasks failed in this poll
    pub newly_failed: Vec<String>,
    /// Nodes failed because of `newly_failed`
    pub propagated: usize,
    pub aggregate: RunStatus,
}

pub struct RunAggregator {
    tasks_by_node: IndexMap<String, Vec<String>>,
    last_emitted: HashMap<String, NodeStatus>,
}

impl RunAggregator {
    pub fn new(tasks_by_node: IndexMap<String, Vec<String>>) -> Self {
        Self {
            tasks_by_node,
            last_emitted: HashMap::new(),
        }
    }

    pub fn status_of(&self, node_id: &str) -> NodeStatus {
        self.last_emitted.get(node_id).copied().unwrap_or_default()
    }

    pub fn aggregate(&self) -> RunStatus {
        RunStatus::aggregate(self.tasks_by_node.keys().map(|id| self.status_of(id)))
    }

    /// Nodes that have not reached a terminal status yet.
    pub fn pending_count(&self) -> usize {
        self.tasks_by_node
            .keys()
            .filter(|id| !self.status_of(id).is_terminal())
            .count()
    }

    /// Fold one poll of `phases` (keyed by possibly qualified task name).
    pub fn observe(&mut self, phases: &HashMap<String, Phase>) -> Observation {
        let mut observation = Observation::default();

        let computed: Vec<(String, NodeStatus, String)> = self
            .tasks_by_node
            .iter()
            .filter(|(node_id, _)| !self.status_of(node_id).is_terminal())
            .map(|(node_id, tasks)| {
                let (status, message) = compute_node_status(tasks, phases);
                (node_id.clone(), status, message)
            })
            .collect();

        // a failing poll goes straight to the forced errors below
        let any_failed = computed.iter().any(|(_, status, _)| *status == NodeStatus::Error);
        for (node_id, status, message) in computed {
            if any_failed && !status.is_terminal() {
                continue;
            }
            if let Some(update) = self.record(&node_id, status, message) {
                if update.status == NodeStatus::Error {
                    observation.newly_failed.push(node_id);
                }
                observation.updates.push(update);
            }
        }

        if !observation.newly_failed.is_empty() {
            let forced = self.force_non_terminal(UPSTREAM_FAILURE);
            observation.propagated = forced.len();
            observation.updates.extend(forced);
        }

        observation.aggregate = self.aggregate();
        observation
    }

    /// Fail every node that is not terminal yet; used for upstream failure,
    /// timeout and cancellation.
    pub fn force_non_terminal(&mut self, message: &str) -> Vec<StatusUpdate> {
        let pending: Vec<String> = self
            .tasks_by_node
            .keys()
            .filter(|id| !self.status_of(id).is_terminal())
            .cloned()
            .collect();

        pending
            .into_iter()
            .filter_map(|id| self.record(&id, NodeStatus::Error, message.to_string()))
            .collect()
    }

    fn record(&mut self, node_id: &str, status: NodeStatus, message: String) -> Option<StatusUpdate> {
        let previous = self.last_emitted.get(node_id).copied();
        if previous == Some(status) || previous.is_some_and(NodeStatus::is_terminal) {
            return None;
        }
        self.last_emitted.insert(node_id.to_string(), status);
        Some(StatusUpdate {
            node_id: node_id.to_string(),
            status,
            message,
        })
    }
}

/// Engine task names may be qualified as `<container>.<task>`.
fn matches_task(reported: &str, task: &str) -> bool {
    reported == task
        || reported
            .strip_suffix(task)
            .is_some_and(|head| head.ends_with('.'))
}

fn compute_node_status(tasks: &[String], phases: &HashMap<String, Phase>) -> (NodeStatus, String) {
    let own: Vec<(&String, &Phase)> = tasks
        .iter()
        .flat_map(|task| {
            phases
                .iter()
                .filter(move |(reported, _)| matches_task(reported, task))
                .map(move |(_, phase)| (task, phase))
        })
        .collect();

    if let Some((task, phase)) = own.iter().find(|(_, phase)| phase.is_failure()) {
        return (NodeStatus::Error, format!("{task}: {phase}"));
    }
    if !own.is_empty() && own.len() == tasks.len() && own.iter().all(|(_, p)| p.is_success()) {
        return (NodeStatus::Success, Phase::Succeeded.to_string());
    }

    let message = if own.iter().any(|(_, phase)| **phase != Phase::Pending) {
        Phase::Running
    } else {
        Phase::Pending
    };
    (NodeStatus::Running, message.to_string())
}
