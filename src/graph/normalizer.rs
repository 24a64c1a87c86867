// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Boundary validation of an inbound graph request.
//!
//! The normalizer runs once per request and produces the [`WorkingSet`] every
//! later stage relies on, so nothing downstream re-checks ids or edges.
//!
//! # Pipeline
//!
//! 1. **Identity**: every node needs a non-empty, unique id
//! 2. **Selection**: restrict to `selected` when given, else keep every node
//! 3. **Induced edges**: keep edges whose endpoints both survived
//! 4. **Ancestor closure**: when a dataset-consuming stage is a sink, the DAG is
//!    those sinks plus all of their ancestors; anything else selected runs on
//!    its own as an independent single-node run

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

use crate::errors::ValidationError;
use crate::graph::{DependencyGraph, Edge, GraphNode, GraphRequest};
use crate::observability::messages::graph::{SelectionNormalized, UnknownSelection};
use crate::observability::messages::StructuredLog;
use crate::stage::{classify, is_dataset_consumer};

/// Validated subgraph ready for layering.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    /// Nodes of the DAG, keyed by id, in request order
    pub nodes: IndexMap<String, GraphNode>,
    /// Induced edges between `nodes`
    pub graph: DependencyGraph,
    /// Selected nodes outside the DAG; each runs as its own single-node plan
    pub independent: Vec<GraphNode>,
}

impl WorkingSet {
    /// A one-node working set for the degenerate single-node path.
    pub fn single(node: GraphNode) -> Self {
        let mut graph = DependencyGraph::new();
        graph.add_node(node.id.clone());
        let mut nodes = IndexMap::new();
        nodes.insert(node.id.clone(), node);
        Self {
            nodes,
            graph,
            independent: Vec::new(),
        }
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.graph.edges()
    }
}

pub struct GraphNormalizer;

impl GraphNormalizer {
    /// Normalize a full request.
    pub fn normalize_request(request: &GraphRequest) -> Result<WorkingSet, ValidationError> {
        Self::normalize(
            &request.workflow.nodes,
            &request.workflow.edges,
            &request.selected,
        )
    }

    /// Validate `nodes`/`edges` and restrict them to the working set.
    ///
    /// # Errors
    /// * [`ValidationError::MissingNodeId`] / [`ValidationError::DuplicateNodeId`]
    ///   when node identity is broken
    /// * [`ValidationError::EmptySelection`] when nothing is left to run
    pub fn normalize(
        nodes: &[GraphNode],
        edges: &[Edge],
        selected: &[String],
    ) -> Result<WorkingSet, ValidationError> {
        let mut all: IndexMap<String, &GraphNode> = IndexMap::new();
        for (index, node) in nodes.iter().enumerate() {
            if node.id.trim().is_empty() {
                return Err(ValidationError::MissingNodeId { index });
            }
            if all.insert(node.id.clone(), node).is_some() {
                return Err(ValidationError::DuplicateNodeId {
                    node_id: node.id.clone(),
                });
            }
        }

        let selection: HashSet<&str> = selected.iter().map(String::as_str).collect();
        for id in &selection {
            if !all.contains_key(*id) {
                UnknownSelection { node_id: *id }.log();
            }
        }

        let chosen: IndexMap<String, &GraphNode> = all
            .into_iter()
            .filter(|(id, _)| selection.is_empty() || selection.contains(id.as_str()))
            .collect();

        if chosen.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        let selected_graph = DependencyGraph::induced(chosen.keys(), edges);

        let consumer_sinks: Vec<String> = selected_graph
            .sinks()
            .into_iter()
            .filter(|id| {
                chosen
                    .get(id)
                    .map(|node| is_dataset_consumer(classify(node.kind())))
                    .unwrap_or(false)
            })
            .collect();

        let keep: IndexSet<String> = if consumer_sinks.is_empty() {
            chosen.keys().cloned().collect()
        } else {
            selected_graph.ancestor_closure(&consumer_sinks)
        };

        let mut working = IndexMap::new();
        let mut independent = Vec::new();
        for (id, node) in chosen {
            if keep.contains(&id) {
                working.insert(id, node.clone());
            } else {
                independent.push(node.clone());
            }
        }

        let graph = DependencyGraph::induced(working.keys(), edges);

        SelectionNormalized {
            node_count: working.len(),
            edge_count: graph.edges().len(),
            independent_count: independent.len(),
        }
        .log();

        Ok(WorkingSet {
            nodes: working,
            graph,
            independent,
        })
    }
}
