// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for run watchers and status delivery.
//!
//! This module contains message types for logging events related to:
//! * Watcher lifecycle (start, timeout, cancellation, completion)
//! * Per-node status transitions and failure propagation
//! * Status store failures

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A watcher started polling a run.
///
/// # Log Level
/// `info!` - Important operational event
pub struct WatcherStarted<'a> {
    pub run_id: &'a str,
    pub engine_handle: &'a str,
    pub node_count: usize,
    pub poll_interval: Duration,
}

impl Display for WatcherStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Watching run {} ('{}'): {} nodes, polling every {:?}",
            self.run_id, self.engine_handle, self.node_count, self.poll_interval
        )
    }
}

impl StructuredLog for WatcherStarted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            engine_handle = self.engine_handle,
            node_count = self.node_count,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "watcher",
            span_name = name,
            run_id = self.run_id,
            engine_handle = self.engine_handle,
        )
    }
}

/// A status query failed; the watcher keeps polling.
///
/// # Log Level
/// `warn!` - Recoverable issue
pub struct PollFailed<'a> {
    pub engine_handle: &'a str,
    pub elapsed: Duration,
    pub error: &'a dyn Display,
}

impl Display for PollFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Status query for '{}' failed after {:?}: {}",
            self.engine_handle, self.elapsed, self.error
        )
    }
}

impl StructuredLog for PollFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            engine_handle = self.engine_handle,
            elapsed_ms = self.elapsed.as_millis() as u64,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("poll_failed", span_name = name, engine_handle = self.engine_handle)
    }
}

/// A node's computed status changed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic
pub struct NodeStatusChanged<'a> {
    pub run_id: &'a str,
    pub node_id: &'a str,
    pub status: &'a str,
    pub message: &'a str,
}

impl Display for NodeStatusChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' is now {}", self.node_id, self.status)?;
        if !self.message.is_empty() {
            write!(f, " ({})", self.message)?;
        }
        Ok(())
    }
}

impl StructuredLog for NodeStatusChanged<'_> {
    fn log(&self) {
        tracing::debug!(
            run_id = self.run_id,
            node_id = self.node_id,
            status = self.status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_status",
            span_name = name,
            run_id = self.run_id,
            node_id = self.node_id,
        )
    }
}

/// A node failed and the rest of the run was failed with it.
///
/// # Log Level
/// `warn!` - Recoverable issue
///
/// # Example
/// ```
/// use ngiab_orchestrator::observability::messages::watch::UpstreamFailurePropagated;
///
/// let failed = vec!["cal".to_string()];
/// let msg = UpstreamFailurePropagated {
///     run_id: "r1",
///     failed_nodes: &failed,
///     affected_count: 2,
/// };
///
/// assert_eq!(msg.to_string(), "Run r1: cal failed, 2 other nodes marked as upstream failure");
/// ```
pub struct UpstreamFailurePropagated<'a> {
    pub run_id: &'a str,
    pub failed_nodes: &'a [String],
    pub affected_count: usize,
}

impl Display for UpstreamFailurePropagated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {}: {} failed, {} other nodes marked as upstream failure",
            self.run_id,
            self.failed_nodes.join(", "),
            self.affected_count
        )
    }
}

impl StructuredLog for UpstreamFailurePropagated<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            failed_nodes = self.failed_nodes.join(", "),
            affected_count = self.affected_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("upstream_failure", span_name = name, run_id = self.run_id)
    }
}

/// The watcher gave up waiting for the run.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PollTimedOut<'a> {
    pub run_id: &'a str,
    pub engine_handle: &'a str,
    pub pending_nodes: usize,
}

impl Display for PollTimedOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} ('{}') timed out with {} nodes still pending",
            self.run_id, self.engine_handle, self.pending_nodes
        )
    }
}

impl StructuredLog for PollTimedOut<'_> {
    fn log(&self) {
        tracing::error!(
            run_id = self.run_id,
            engine_handle = self.engine_handle,
            pending_nodes = self.pending_nodes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("poll_timeout", span_name = name, run_id = self.run_id)
    }
}

/// The watcher was cancelled by its owner.
///
/// # Log Level
/// `warn!` - Recoverable issue
pub struct WatcherCancelled<'a> {
    pub run_id: &'a str,
    pub pending_nodes: usize,
}

impl Display for WatcherCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Watcher for run {} cancelled with {} nodes still pending",
            self.run_id, self.pending_nodes
        )
    }
}

impl StructuredLog for WatcherCancelled<'_> {
    fn log(&self) {
        tracing::warn!(
            run_id = self.run_id,
            pending_nodes = self.pending_nodes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("watch_cancelled", span_name = name, run_id = self.run_id)
    }
}

/// The watcher reached a terminal aggregate status.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunFinished<'a> {
    pub run_id: &'a str,
    pub status: &'a str,
    pub polls: u32,
}

impl Display for RunFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} finished as {} after {} polls",
            self.run_id, self.status, self.polls
        )
    }
}

impl StructuredLog for RunFinished<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            status = self.status,
            polls = self.polls,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("run_finished", span_name = name, run_id = self.run_id)
    }
}

/// Persisting a status update failed.
///
/// # Log Level
/// `warn!` - the event is still forwarded to listeners
pub struct StatusStoreFailed<'a> {
    pub run_id: &'a str,
    pub error: &'a dyn Display,
}

impl Display for StatusStoreFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Could not store status for run {}: {}", self.run_id, self.error)
    }
}

impl StructuredLog for StatusStoreFailed<'_> {
    fn log(&self) {
        tracing::warn!(run_id = self.run_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("status_store", span_name = name, run_id = self.run_id)
    }
}
