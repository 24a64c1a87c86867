// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Status delivery from watchers to persistence and listeners.
//!
//! Watchers and the adapter only ever send [`RunEvent`]s down an unbounded
//! channel. A single [`StatusDispatcher`] drains it, so per-run ordering is the
//! order events were sent and no watcher touches the store directly.

mod dispatcher;
mod memory;

pub use dispatcher::StatusDispatcher;
pub use memory::InMemoryStatusStore;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::engine::{NodeStatus, WorkflowRun};
use crate::traits::RunHandle;

/// Sender for run events
pub type EventSender = mpsc::UnboundedSender<RunEvent>;

/// Receiver for run events
pub type EventReceiver = mpsc::UnboundedReceiver<RunEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Sender for listener notifications
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Receiver for listener notifications
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Run record created before submission
    RunRegistered(Box<WorkflowRun>),

    /// Engine accepted the run
    Submitted { run_id: String, engine_handle: RunHandle },

    /// A node changed status
    NodeStatus {
        run_id: String,
        node_id: String,
        status: NodeStatus,
        message: String,
    },

    /// Every node succeeded
    RunCompleted {
        run_id: String,
        artifact_location: String,
    },
}

impl RunEvent {
    pub fn node_status(
        run_id: impl Into<String>,
        node_id: impl Into<String>,
        status: NodeStatus,
        message: impl Into<String>,
    ) -> Self {
        Self::NodeStatus {
            run_id: run_id.into(),
            node_id: node_id.into(),
            status,
            message: message.into(),
        }
    }

    pub fn run_completed(run_id: impl Into<String>, artifact_location: impl Into<String>) -> Self {
        Self::RunCompleted {
            run_id: run_id.into(),
            artifact_location: artifact_location.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            RunEvent::RunRegistered(run) => &run.id,
            RunEvent::Submitted { run_id, .. }
            | RunEvent::NodeStatus { run_id, .. }
            | RunEvent::RunCompleted { run_id, .. } => run_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusNotification {
    pub run_id: String,
    pub node_id: String,
    pub status: NodeStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCompletedNotification {
    pub run_id: String,
    pub artifact_location: String,
}

/// What listeners (the UI, the CLI) receive.
///
/// ```
/// use ngiab_orchestrator::engine::NodeStatus;
/// use ngiab_orchestrator::sink::{Notification, NodeStatusNotification};
///
/// let event = Notification::NodeStatus(NodeStatusNotification {
///     run_id: "r1".into(),
///     node_id: "cal".into(),
///     status: NodeStatus::Running,
///     message: "Pending".into(),
/// });
///
/// assert_eq!(
///     serde_json::to_string(&event).unwrap(),
///     r#"{"runId":"r1","nodeId":"cal","status":"running","message":"Pending"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Notification {
    NodeStatus(NodeStatusNotification),
    RunCompleted(RunCompletedNotification),
}
