// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for execution-engine interaction.
//!
//! This module contains message types for logging events related to:
//! * Stage template registration
//! * DAG submission and rejection

use crate::observability::messages::StructuredLog;
use crate::traits::TemplateOutcome;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Stage template is available in the engine registry.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use ngiab_orchestrator::observability::messages::engine::TemplateEnsured;
/// use ngiab_orchestrator::traits::TemplateOutcome;
///
/// let msg = TemplateEnsured {
///     template: "ngiab-run",
///     outcome: TemplateOutcome::AlreadyPresent,
/// };
///
/// assert_eq!(msg.to_string(), "Stage template 'ngiab-run' already present");
/// ```
pub struct TemplateEnsured<'a> {
    pub template: &'a str,
    pub outcome: TemplateOutcome,
}

impl Display for TemplateEnsured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage template '{}' {}", self.template, self.outcome)
    }
}

impl StructuredLog for TemplateEnsured<'_> {
    fn log(&self) {
        tracing::info!(
            template = self.template,
            outcome = %self.outcome,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("template", span_name = name, template = self.template)
    }
}

/// Deleting a template before a forced update failed.
///
/// # Log Level
/// `warn!` - creation is still attempted
pub struct TemplateDeleteFailed<'a> {
    pub template: &'a str,
    pub error: &'a dyn Display,
}

impl Display for TemplateDeleteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Could not delete stage template '{}' before update: {}",
            self.template, self.error
        )
    }
}

impl StructuredLog for TemplateDeleteFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            template = self.template,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("template_delete", span_name = name, template = self.template)
    }
}

/// The engine accepted a DAG.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DagSubmitted<'a> {
    pub run_id: &'a str,
    pub engine_handle: &'a str,
    pub task_count: usize,
}

impl Display for DagSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Submitted run {} as '{}' with {} tasks",
            self.run_id, self.engine_handle, self.task_count
        )
    }
}

impl StructuredLog for DagSubmitted<'_> {
    fn log(&self) {
        tracing::info!(
            run_id = self.run_id,
            engine_handle = self.engine_handle,
            task_count = self.task_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "submission",
            span_name = name,
            run_id = self.run_id,
            engine_handle = self.engine_handle,
        )
    }
}

/// Submission failed; every node of the run is marked as failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct SubmissionFailed<'a> {
    pub run_id: &'a str,
    pub node_count: usize,
    pub error: &'a dyn Display,
}

impl Display for SubmissionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Submission of run {} failed, marking {} nodes as error: {}",
            self.run_id, self.node_count, self.error
        )
    }
}

impl StructuredLog for SubmissionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            run_id = self.run_id,
            node_count = self.node_count,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("submission_failed", span_name = name, run_id = self.run_id)
    }
}
