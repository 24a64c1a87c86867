// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Submission to the execution engine and reconciliation of its phase reports.

pub mod adapter;
pub mod aggregator;
pub mod phase;
pub mod state;
pub mod watcher;

pub use adapter::{ExecutionAdapter, SubmittedRun};
pub use aggregator::RunAggregator;
pub use phase::Phase;
pub use state::{NodeRunState, NodeStatus, RunStatus, WorkflowRun};
pub use watcher::StatusWatcher;
