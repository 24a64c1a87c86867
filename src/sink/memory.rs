// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::engine::{NodeRunState, NodeStatus, RunStatus, WorkflowRun};
use crate::errors::SinkError;
use crate::traits::{RunHandle, StatusStore};

/// Process-local [`StatusStore`], used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    runs: RwLock<HashMap<String, WorkflowRun>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a stored run.
    pub async fn run(&self, run_id: &str) -> Option<WorkflowRun> {
        self.runs.read().await.get(run_id).cloned()
    }

    pub async fn run_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.runs.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn register_run(&self, run: &WorkflowRun) -> Result<(), SinkError> {
        self.runs.write().await.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn set_engine_handle(&self, run_id: &str, handle: &RunHandle) -> Result<(), SinkError> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| SinkError::UnknownRun(run_id.to_string()))?;
        run.engine_handle = Some(handle.clone());
        Ok(())
    }

    async fn upsert_node_status(
        &self,
        run_id: &str,
        node_id: &str,
        status: NodeStatus,
        message: &str,
    ) -> Result<(), SinkError> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| SinkError::UnknownRun(run_id.to_string()))?;
        let state = run
            .node_status
            .get_mut(node_id)
            .ok_or_else(|| SinkError::UnknownNode {
                run_id: run_id.to_string(),
                node_id: node_id.to_string(),
            })?;
        *state = NodeRunState {
            status,
            message: message.to_string(),
        };
        Ok(())
    }

    async fn recompute_and_store_run_status(&self, run_id: &str) -> Result<RunStatus, SinkError> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(run_id)
            .ok_or_else(|| SinkError::UnknownRun(run_id.to_string()))?;
        run.status = RunStatus::aggregate(run.node_status.values().map(|state| state.status));
        Ok(run.status)
    }
}
