// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // execution engine backends + bundled templates
pub mod config;        // env + file configuration
pub mod engine;        // submission, watching, status aggregation
pub mod errors;        // error handling
pub mod graph;         // graph model, normalization, layering
pub mod observability;
pub mod orchestrator;  // request → runs
pub mod plan;          // task instances and their arguments
pub mod sink;          // status events → store + listeners
pub mod stage;         // stage tags and parent policy
pub mod traits;        // engine and store boundaries
