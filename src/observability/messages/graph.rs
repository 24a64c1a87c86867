// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for request normalization and planning.
//!
//! This module contains message types for logging events related to:
//! * Selection and ancestor-closure results
//! * Topological layering and cycle detection
//! * Task instance planning

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Working set computed from a request.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SelectionNormalized {
    pub node_count: usize,
    pub edge_count: usize,
    pub independent_count: usize,
}

impl Display for SelectionNormalized {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Working set has {} nodes and {} edges; {} independent nodes",
            self.node_count, self.edge_count, self.independent_count
        )
    }
}

impl StructuredLog for SelectionNormalized {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            edge_count = self.edge_count,
            independent_count = self.independent_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "selection",
            span_name = name,
            node_count = self.node_count,
            edge_count = self.edge_count,
        )
    }
}

/// A selected id does not exist in the submitted graph.
///
/// # Log Level
/// `warn!` - the id is ignored
pub struct UnknownSelection<'a> {
    pub node_id: &'a str,
}

impl Display for UnknownSelection<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Selected node '{}' is not in the graph; ignoring", self.node_id)
    }
}

impl StructuredLog for UnknownSelection<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("unknown_selection", span_name = name, node_id = self.node_id)
    }
}

/// Layer computation completed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic
///
/// # Example
/// ```
/// use ngiab_orchestrator::observability::messages::graph::LayeringCompleted;
///
/// let msg = LayeringCompleted {
///     layer_count: 3,
///     node_count: 7,
/// };
///
/// assert_eq!(msg.to_string(), "Computed 3 layers for 7 nodes");
/// ```
pub struct LayeringCompleted {
    pub layer_count: usize,
    pub node_count: usize,
}

impl Display for LayeringCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Computed {} layers for {} nodes",
            self.layer_count, self.node_count
        )
    }
}

impl StructuredLog for LayeringCompleted {
    fn log(&self) {
        tracing::debug!(
            layer_count = self.layer_count,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "layering",
            span_name = name,
            layer_count = self.layer_count,
            node_count = self.node_count,
        )
    }
}

/// Cyclic dependency detected in the working set.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use ngiab_orchestrator::observability::messages::graph::CycleDetected;
///
/// let unresolved = vec!["a".to_string(), "b".to_string()];
/// let msg = CycleDetected { unresolved: &unresolved };
///
/// assert_eq!(msg.to_string(), "Cyclic dependency detected among: a, b");
/// ```
pub struct CycleDetected<'a> {
    pub unresolved: &'a [String],
}

impl Display for CycleDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cyclic dependency detected among: {}",
            self.unresolved.join(", ")
        )
    }
}

impl StructuredLog for CycleDetected<'_> {
    fn log(&self) {
        tracing::error!(
            unresolved = self.unresolved.join(", "),
            unresolved_count = self.unresolved.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "cycle_detected",
            span_name = name,
            unresolved_count = self.unresolved.len(),
        )
    }
}

/// Task instances planned for a run.
///
/// # Log Level
/// `info!` - Important operational event
pub struct InstancesPlanned<'a> {
    pub run_id: &'a str,
    pub node_count: usize,
    pub instance_count: usize,
}

impl Display for InstancesPlanned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Planned {} task instances for {} nodes in run {}",
            self.instance_count, self.node_count, self.run_id
        )
    }
}

impl StructuredLog for InstancesPlanned<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            node_count = self.node_count,
            instance_count = self.instance_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "planning",
            span_name = name,
            run_id = self.run_id,
            instance_count = self.instance_count,
        )
    }
}
