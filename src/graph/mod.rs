// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph model, normalization and topological layering.

mod dependency_graph;
mod layering;
mod model;
mod normalizer;

pub use dependency_graph::DependencyGraph;
pub use layering::{compute_layers, Layering};
pub use model::{Edge, GraphNode, GraphRequest, WorkflowGraph};
pub use normalizer::{GraphNormalizer, WorkingSet};
