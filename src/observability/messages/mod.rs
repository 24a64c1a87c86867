// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `graph` - request normalization, layering and planning
//! * `engine` - template management and DAG submission
//! * `watch` - status polling, aggregation and run completion

use tracing::Span;

pub mod engine;
pub mod graph;
pub mod watch;

/// A log event that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the event at its level.
    fn log(&self);

    /// Open a span carrying the same fields.
    fn span(&self, name: &str) -> Span;
}
