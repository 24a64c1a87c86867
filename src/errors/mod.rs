// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod engine;
mod validation;

pub use config::ConfigError;
pub use engine::{EngineError, SinkError, SubmissionError};
pub use validation::ValidationError;

use thiserror::Error;

/// Top-level error for a workflow request that never reached a watcher.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
