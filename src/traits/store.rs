// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{NodeStatus, RunStatus, WorkflowRun};
use crate::errors::SinkError;
use crate::traits::RunHandle;

/// Persistence boundary for run and node status.
///
/// Every call is a short, independent update; implementations must not hold
/// locks across calls.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Create the run record with every node `idle`.
    async fn register_run(&self, run: &WorkflowRun) -> Result<(), SinkError>;

    /// Record the engine handle once the engine accepted the run.
    async fn set_engine_handle(&self, run_id: &str, handle: &RunHandle) -> Result<(), SinkError>;

    async fn upsert_node_status(
        &self,
        run_id: &str,
        node_id: &str,
        status: NodeStatus,
        message: &str,
    ) -> Result<(), SinkError>;

    /// Re-derive the aggregate from the stored node states and persist it.
    async fn recompute_and_store_run_status(&self, run_id: &str) -> Result<RunStatus, SinkError>;
}
