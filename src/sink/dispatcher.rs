// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::errors::SinkError;
use crate::observability::messages::watch::StatusStoreFailed;
use crate::observability::messages::StructuredLog;
use crate::sink::{
    EventReceiver, NodeStatusNotification, Notification, NotificationSender, RunCompletedNotification,
    RunEvent,
};
use crate::traits::StatusStore;

/// Drains run events into the status store and forwards them to listeners.
pub struct StatusDispatcher {
    store: Arc<dyn StatusStore>,
    notifier: Option<NotificationSender>,
}

impl StatusDispatcher {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self {
            store,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: NotificationSender) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn spawn(self, events: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Runs until every event sender has been dropped.
    pub async fn run(self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            let run_id = event.run_id().to_string();
            if let Err(e) = self.handle(event).await {
                StatusStoreFailed {
                    run_id: &run_id,
                    error: &e,
                }
                .log();
            }
        }
        tracing::debug!("Status dispatcher stopped: all event senders closed");
    }

    async fn handle(&self, event: RunEvent) -> Result<(), SinkError> {
        match event {
            RunEvent::RunRegistered(run) => self.store.register_run(&run).await,
            RunEvent::Submitted {
                run_id,
                engine_handle,
            } => self.store.set_engine_handle(&run_id, &engine_handle).await,
            RunEvent::NodeStatus {
                run_id,
                node_id,
                status,
                message,
            } => {
                // listeners hear about the transition even if persisting it fails
                let stored = self
                    .store
                    .upsert_node_status(&run_id, &node_id, status, &message)
                    .await;
                self.notify(Notification::NodeStatus(NodeStatusNotification {
                    run_id: run_id.clone(),
                    node_id,
                    status,
                    message,
                }));
                stored?;
                self.store.recompute_and_store_run_status(&run_id).await?;
                Ok(())
            }
            RunEvent::RunCompleted {
                run_id,
                artifact_location,
            } => {
                self.notify(Notification::RunCompleted(RunCompletedNotification {
                    run_id,
                    artifact_location,
                }));
                Ok(())
            }
        }
    }

    fn notify(&self, notification: Notification) {
        if let Some(notifier) = &self.notifier {
            if notifier.send(notification).is_err() {
                tracing::debug!("Notification listener is gone; dropping notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NodeStatus, RunStatus, WorkflowRun};
    use crate::graph::{GraphNode, WorkingSet};
    use crate::sink::{event_channel, notification_channel, InMemoryStatusStore};
    use crate::traits::RunHandle;

    #[tokio::test]
    async fn test_events_reach_store_and_listener() {
        let store = Arc::new(InMemoryStatusStore::new());
        let (events, receiver) = event_channel();
        let (notifier, mut notifications) = notification_channel();
        let dispatcher = StatusDispatcher::new(store.clone())
            .with_notifier(notifier)
            .spawn(receiver);

        let working = WorkingSet::single(GraphNode::new("a", "teehr"));
        let run = WorkflowRun::new("r1", "alice", &working);
        events.send(RunEvent::RunRegistered(Box::new(run))).unwrap();
        events
            .send(RunEvent::Submitted {
                run_id: "r1".into(),
                engine_handle: RunHandle("ngiab-teehr-abc".into()),
            })
            .unwrap();
        events
            .send(RunEvent::node_status("r1", "a", NodeStatus::Success, "Succeeded"))
            .unwrap();
        events
            .send(RunEvent::run_completed("r1", "s3://b/alice/r1/ngiab-teehr-abc"))
            .unwrap();
        drop(events);
        dispatcher.await.unwrap();

        let stored = store.run("r1").await.unwrap();
        assert_eq!(stored.status, RunStatus::Success);
        assert_eq!(stored.engine_handle, Some(RunHandle("ngiab-teehr-abc".into())));
        assert_eq!(stored.node_status["a"].message, "Succeeded");

        let first = notifications.recv().await.unwrap();
        assert!(matches!(first, Notification::NodeStatus(ref n) if n.status == NodeStatus::Success));
        let second = notifications.recv().await.unwrap();
        assert!(matches!(second, Notification::RunCompleted(_)));
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_dispatch() {
        let store = Arc::new(InMemoryStatusStore::new());
        let (events, receiver) = event_channel();
        let (notifier, mut notifications) = notification_channel();
        let dispatcher = StatusDispatcher::new(store.clone())
            .with_notifier(notifier)
            .spawn(receiver);

        events
            .send(RunEvent::node_status("missing", "a", NodeStatus::Error, "boom"))
            .unwrap();
        drop(events);
        dispatcher.await.unwrap();

        let notification = notifications.recv().await.unwrap();
        assert!(matches!(notification, Notification::NodeStatus(ref n) if n.run_id == "missing"));
    }
}
