// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed records for the graph submitted by the editor.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A single user-drawn node.
///
/// `config` is flattened to strings once at the boundary: numbers and booleans
/// are stringified, `null` entries are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "label", default)]
    pub stage_label: String,
    #[serde(default, deserialize_with = "deserialize_config")]
    pub config: BTreeMap<String, String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, stage_label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage_label: stage_label.into(),
            config: BTreeMap::new(),
        }
    }

    /// Builder-style helper used by tests and the CLI demos.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Label used for classification; the editor sometimes leaves it empty.
    pub fn kind(&self) -> &str {
        if self.stage_label.is_empty() {
            &self.id
        } else {
            &self.stage_label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Nodes and edges exactly as drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Inbound run request: `{ workflow: {nodes, edges}, selected: [..]? }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRequest {
    #[serde(default)]
    pub workflow: WorkflowGraph,
    #[serde(default)]
    pub selected: Vec<String>,
}

fn deserialize_config<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}
