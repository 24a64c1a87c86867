// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::{IndexMap, IndexSet};

use crate::graph::Edge;

/// Newtype wrapper for the forward adjacency list (node -> [children]).
///
/// Node order is the order in which ids were supplied, which keeps layering and
/// instance naming deterministic for a given request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph(pub IndexMap<String, Vec<String>>);

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Build the induced graph over `node_ids`.
    ///
    /// Edges with an endpoint outside `node_ids` are dropped and repeated edges
    /// collapse into one.
    pub fn induced<'a, I>(node_ids: I, edges: &[Edge]) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut graph = Self::new();
        for id in node_ids {
            graph.add_node(id.clone());
        }
        for edge in edges {
            if graph.contains(&edge.source) && graph.contains(&edge.target) {
                graph.add_edge(&edge.source, &edge.target);
            }
        }
        graph
    }

    pub fn add_node(&mut self, node_id: String) {
        self.0.entry(node_id).or_default();
    }

    /// Add a `source -> target` relationship; duplicates are ignored.
    pub fn add_edge(&mut self, source: &str, target: &str) {
        let children = self.0.entry(source.to_string()).or_default();
        if !children.iter().any(|c| c == target) {
            children.push(target.to_string());
        }
        self.0.entry(target.to_string()).or_default();
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.0.contains_key(node_id)
    }

    /// Children of a node, empty for unknown ids
    pub fn children(&self, node_id: &str) -> &[String] {
        self.0.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All node ids in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Edges of the graph in insertion order.
    pub fn edges(&self) -> Vec<Edge> {
        self.0
            .iter()
            .flat_map(|(source, children)| children.iter().map(move |t| Edge::new(source, t)))
            .collect()
    }

    /// Reverse adjacency (node -> [parents]), every node present.
    pub fn build_reverse_dependencies(&self) -> IndexMap<String, Vec<String>> {
        let mut parents: IndexMap<String, Vec<String>> =
            self.0.keys().map(|k| (k.clone(), Vec::new())).collect();
        for (source, children) in &self.0 {
            for child in children {
                if let Some(list) = parents.get_mut(child) {
                    list.push(source.clone());
                }
            }
        }
        parents
    }

    /// In-degree of every node.
    pub fn build_dependency_counts(&self) -> IndexMap<String, usize> {
        self.build_reverse_dependencies()
            .into_iter()
            .map(|(id, parents)| (id, parents.len()))
            .collect()
    }

    /// Nodes with no outgoing edges.
    pub fn sinks(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, children)| children.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// `roots` plus every node from which a root is reachable.
    pub fn ancestor_closure<'a, I>(&self, roots: I) -> IndexSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let parents = self.build_reverse_dependencies();
        let mut keep = IndexSet::new();
        let mut stack: Vec<String> = roots.into_iter().cloned().collect();
        while let Some(current) = stack.pop() {
            if !keep.insert(current.clone()) {
                continue;
            }
            if let Some(ps) = parents.get(&current) {
                stack.extend(ps.iter().cloned());
            }
        }
        keep
    }
}

impl From<IndexMap<String, Vec<String>>> for DependencyGraph {
    fn from(graph: IndexMap<String, Vec<String>>) -> Self {
        Self(graph)
    }
}

impl From<DependencyGraph> for IndexMap<String, Vec<String>> {
    fn from(graph: DependencyGraph) -> Self {
        graph.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_induced_drops_foreign_and_duplicate_edges() {
        let nodes = ids(&["a", "b"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("a", "b"), Edge::new("b", "zzz")];
        let graph = DependencyGraph::induced(&nodes, &edges);

        assert_eq!(graph.children("a"), &["b".to_string()]);
        assert!(graph.children("b").is_empty());
        assert!(!graph.contains("zzz"));
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_reverse_dependencies_and_counts() {
        let nodes = ids(&["a", "b", "c"]);
        let edges = vec![Edge::new("a", "c"), Edge::new("b", "c")];
        let graph = DependencyGraph::induced(&nodes, &edges);

        let parents = graph.build_reverse_dependencies();
        assert_eq!(parents["c"], ids(&["a", "b"]));
        assert!(parents["a"].is_empty());

        let counts = graph.build_dependency_counts();
        assert_eq!(counts["c"], 2);
        assert_eq!(counts["a"], 0);
        assert_eq!(graph.sinks(), ids(&["c"]));
    }

    #[test]
    fn test_ancestor_closure_follows_all_paths() {
        // a -> b -> d, c -> d, e isolated
        let nodes = ids(&["a", "b", "c", "d", "e"]);
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "d"), Edge::new("c", "d")];
        let graph = DependencyGraph::induced(&nodes, &edges);

        let roots = ids(&["d"]);
        let closure = graph.ancestor_closure(&roots);
        assert_eq!(closure.len(), 4);
        assert!(!closure.contains("e"));
    }
}
