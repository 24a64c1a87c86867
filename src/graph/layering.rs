// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;

use crate::errors::ValidationError;
use crate::graph::DependencyGraph;
use crate::observability::messages::graph::{CycleDetected, LayeringCompleted};
use crate::observability::messages::StructuredLog;

/// Result of Kahn's algorithm over a [`DependencyGraph`].
///
/// `unresolved` holds the nodes whose in-degree never reached zero. It is only
/// non-empty when the graph has a cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layering {
    pub layers: Vec<Vec<String>>,
    pub unresolved: Vec<String>,
}

impl Layering {
    pub fn has_cycle(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Ordered layers, or a cycle error when any node could not be placed.
    pub fn into_ordered(self) -> Result<Vec<Vec<String>>, ValidationError> {
        if self.has_cycle() {
            return Err(ValidationError::CyclicSubgraph {
                unresolved: self.unresolved,
            });
        }
        Ok(self.layers)
    }
}

/// Compute topological layers with Kahn's algorithm.
///
/// Layer 0 holds every node without parents; layer N holds the nodes whose
/// parents all sit in layers `0..N`. Within a layer, nodes keep graph insertion
/// order. Nodes caught in a cycle end up in [`Layering::unresolved`] instead of
/// looping forever.
///
/// ## Complexity
/// O(V + E): each node enters the frontier once and each edge is decremented once.
pub fn compute_layers(graph: &DependencyGraph) -> Layering {
    let mut in_degree = graph.build_dependency_counts();

    let mut frontier: VecDeque<String> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| id.clone())
        .collect();

    let mut layers = Vec::new();
    let mut placed = 0usize;

    while !frontier.is_empty() {
        let current: Vec<String> = frontier.drain(..).collect();
        placed += current.len();

        for node_id in &current {
            for child in graph.children(node_id) {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        frontier.push_back(child.clone());
                    }
                }
            }
        }

        layers.push(current);
    }

    let unresolved: Vec<String> = if placed == graph.len() {
        Vec::new()
    } else {
        in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id)
            .collect()
    };

    if unresolved.is_empty() {
        LayeringCompleted {
            layer_count: layers.len(),
            node_count: placed,
        }
        .log();
    } else {
        CycleDetected {
            unresolved: &unresolved,
        }
        .log();
    }

    Layering { layers, unresolved }
}
