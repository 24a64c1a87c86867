// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while turning a graph request into an execution plan.
///
/// Every variant is reported synchronously to the caller, before anything is
/// submitted to the execution engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The selection (or the whole graph) resolved to zero nodes.
    #[error("Nothing selected to run")]
    EmptySelection,

    /// A node arrived without an identifier.
    #[error("Graph node at position {index} has an empty id")]
    MissingNodeId { index: usize },

    /// Two nodes share the same identifier.
    #[error("Duplicate node id: '{node_id}'")]
    DuplicateNodeId { node_id: String },

    /// The induced subgraph contains at least one cycle.
    #[error("Cyclic dependency among nodes: {}", unresolved.join(", "))]
    CyclicSubgraph {
        /// Nodes whose in-degree never reached zero during layering
        unresolved: Vec<String>,
    },

    /// A dataset URI could not be split into bucket and key.
    #[error("Malformed dataset URI '{uri}' on node '{node_id}': {reason}")]
    MalformedPointerUri {
        node_id: String,
        uri: String,
        reason: String,
    },

    /// A layer referenced a node that is not part of the working set.
    #[error("Node '{node_id}' is not part of the working set")]
    UnknownNode { node_id: String },
}
