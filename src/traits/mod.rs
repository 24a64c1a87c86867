// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod executor;
pub mod store;

pub use executor::{DagSubmission, ExecutionEngine, RunHandle, StageTemplate, TemplateOutcome};
pub use store::StatusStore;
