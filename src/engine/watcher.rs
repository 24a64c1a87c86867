// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One polling loop per submitted run.
//!
//! The loop is sequential: query the engine, fold the phases into the
//! [`RunAggregator`], emit the resulting transitions, then sleep. It stops on a
//! terminal aggregate, on timeout, or when its [`CancellationToken`] fires.
//! Query errors leave node status untouched and count toward the timeout.

use indexmap::IndexMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::WatchOptions;
use crate::engine::aggregator::{StatusUpdate, CANCELLED, POLL_TIMEOUT};
use crate::engine::{RunAggregator, RunStatus};
use crate::observability::messages::watch::{
    NodeStatusChanged, PollFailed, PollTimedOut, RunFinished, UpstreamFailurePropagated,
    WatcherCancelled, WatcherStarted,
};
use crate::observability::messages::StructuredLog;
use crate::sink::{EventSender, RunEvent};
use crate::traits::{ExecutionEngine, RunHandle};

pub struct StatusWatcher {
    engine: Arc<dyn ExecutionEngine>,
    run_id: String,
    handle: RunHandle,
    aggregator: RunAggregator,
    options: WatchOptions,
    events: EventSender,
    cancel: CancellationToken,
    artifact_location: String,
    polls: u32,
}

impl StatusWatcher {
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        run_id: impl Into<String>,
        handle: RunHandle,
        tasks_by_node: IndexMap<String, Vec<String>>,
        options: WatchOptions,
        events: EventSender,
    ) -> Self {
        Self {
            engine,
            run_id: run_id.into(),
            handle,
            aggregator: RunAggregator::new(tasks_by_node),
            options,
            events,
            cancel: CancellationToken::new(),
            artifact_location: String::new(),
            polls: 0,
        }
    }

    /// Location reported in the completion event.
    pub fn with_artifact_location(mut self, artifact_location: impl Into<String>) -> Self {
        self.artifact_location = artifact_location.into();
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn spawn(self) -> JoinHandle<RunStatus> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) -> RunStatus {
        let span = {
            let started = WatcherStarted {
                run_id: &self.run_id,
                engine_handle: self.handle.as_str(),
                node_count: self.aggregator.pending_count(),
                poll_interval: self.options.poll_interval,
            };
            started.log();
            started.span("watch_run")
        };
        self.watch().instrument(span).await
    }

    async fn watch(mut self) -> RunStatus {
        let started = Instant::now();
        loop {
            let polled = tokio::select! {
                _ = self.cancel.cancelled() => None,
                result = self.engine.get_run_phases(&self.handle) => Some(result),
            };
            let Some(result) = polled else {
                return self.cancelled();
            };
            self.polls += 1;

            match result {
                Ok(phases) => {
                    let observation = self.aggregator.observe(&phases);
                    self.emit(observation.updates);

                    if !observation.newly_failed.is_empty() {
                        UpstreamFailurePropagated {
                            run_id: &self.run_id,
                            failed_nodes: &observation.newly_failed,
                            affected_count: observation.propagated,
                        }
                        .log();
                    }

                    match observation.aggregate {
                        RunStatus::Success => {
                            self.send(RunEvent::run_completed(
                                self.run_id.clone(),
                                self.artifact_location.clone(),
                            ));
                            return self.finished(RunStatus::Success);
                        }
                        RunStatus::Error => return self.finished(RunStatus::Error),
                        RunStatus::Idle | RunStatus::Running => {}
                    }
                }
                Err(e) => {
                    PollFailed {
                        engine_handle: self.handle.as_str(),
                        elapsed: started.elapsed(),
                        error: &e,
                    }
                    .log();
                }
            }

            if started.elapsed() >= self.options.timeout {
                return self.timed_out();
            }

            let cancelled = tokio::select! {
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(self.options.poll_interval) => false,
            };
            if cancelled {
                return self.cancelled();
            }
        }
    }

    fn timed_out(&mut self) -> RunStatus {
        PollTimedOut {
            run_id: &self.run_id,
            engine_handle: self.handle.as_str(),
            pending_nodes: self.aggregator.pending_count(),
        }
        .log();
        let forced = self.aggregator.force_non_terminal(POLL_TIMEOUT);
        self.emit(forced);
        self.finished(RunStatus::Error)
    }

    fn cancelled(&mut self) -> RunStatus {
        WatcherCancelled {
            run_id: &self.run_id,
            pending_nodes: self.aggregator.pending_count(),
        }
        .log();
        let forced = self.aggregator.force_non_terminal(CANCELLED);
        self.emit(forced);
        self.finished(self.aggregator.aggregate())
    }

    fn finished(&self, status: RunStatus) -> RunStatus {
        RunFinished {
            run_id: &self.run_id,
            status: status.as_str(),
            polls: self.polls,
        }
        .log();
        status
    }

    fn emit(&self, updates: Vec<StatusUpdate>) {
        for update in updates {
            NodeStatusChanged {
                run_id: &self.run_id,
                node_id: &update.node_id,
                status: update.status.as_str(),
                message: &update.message,
            }
            .log();
            self.send(RunEvent::node_status(
                self.run_id.clone(),
                update.node_id,
                update.status,
                update.message,
            ));
        }
    }

    fn send(&self, event: RunEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!(run_id = %self.run_id, "Event receiver closed; dropping run event");
        }
    }
}
