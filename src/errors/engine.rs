// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors crossing the execution-engine and persistence boundaries.

use thiserror::Error;

/// Failure reported by an [`ExecutionEngine`](crate::traits::ExecutionEngine) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine could not be reached (connect error, timeout, 5xx).
    #[error("Execution engine unavailable: {0}")]
    Unavailable(String),

    /// The engine answered but refused the request.
    #[error("Execution engine rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The object being created is already registered.
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// The requested run or template is unknown to the engine.
    #[error("'{0}' not found")]
    NotFound(String),

    /// The engine response could not be decoded.
    #[error("Could not decode engine response: {0}")]
    Decode(String),

    /// A bundled template definition is missing or unparseable.
    #[error("Template '{name}' is invalid: {reason}")]
    InvalidTemplate { name: String, reason: String },
}

impl EngineError {
    /// Whether a poll that failed with this error should simply be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Unavailable(_))
    }
}

/// Failure while handing an execution plan to the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    /// A stage template could not be verified or created.
    #[error("Template check failed for '{template}': {source}")]
    Template {
        template: String,
        #[source]
        source: EngineError,
    },

    /// The engine refused or never received the DAG.
    #[error("Submit failed: {0}")]
    Rejected(#[source] EngineError),

    /// The plan contained no task instances.
    #[error("Submit failed: execution plan is empty")]
    EmptyPlan,
}

/// Failure reported by a [`StatusStore`](crate::traits::StatusStore).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Unknown run '{0}'")]
    UnknownRun(String),

    #[error("Unknown node '{node_id}' in run '{run_id}'")]
    UnknownNode { run_id: String, node_id: String },

    #[error("Status store failure: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(EngineError::Unavailable("connection refused".into()).is_transient());
        assert!(!EngineError::NotFound("wf".into()).is_transient());
        assert!(!EngineError::Rejected {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
    }

    #[test]
    fn test_submission_error_message_carries_source() {
        let err = SubmissionError::Template {
            template: "ngiab-run".into(),
            source: EngineError::Unavailable("timeout".into()),
        };
        assert_eq!(
            err.to_string(),
            "Template check failed for 'ngiab-run': Execution engine unavailable: timeout"
        );
    }
}
