// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::plan::DatasetPointer;
use crate::stage::StageTag;

/// One executable task in the engine DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    /// Unique within the run
    pub name: String,
    pub stage_tag: StageTag,
    /// Stage template the task runs
    pub template: String,
    /// The graph node this instance was expanded from
    pub source_node_id: String,
    /// Instance names from strictly earlier layers
    pub depends_on: Vec<String>,
    pub arguments: BTreeMap<String, String>,
    /// Dataset handed to downstream instances
    pub produced_pointer: DatasetPointer,
}

/// The instances of a run and which graph node owns each of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPlan {
    /// Instances in layer order
    pub instances: Vec<TaskInstance>,
    pub tasks_by_node: IndexMap<String, Vec<String>>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn instance(&self, name: &str) -> Option<&TaskInstance> {
        self.instances.iter().find(|instance| instance.name == name)
    }

    pub fn instances_for(&self, node_id: &str) -> impl Iterator<Item = &TaskInstance> {
        let names = self.tasks_by_node.get(node_id);
        self.instances
            .iter()
            .filter(move |instance| names.is_some_and(|names| names.contains(&instance.name)))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &String> {
        self.tasks_by_node.keys()
    }

    /// Distinct stage templates the plan references, sorted.
    pub fn templates(&self) -> BTreeSet<&str> {
        self.instances
            .iter()
            .map(|instance| instance.template.as_str())
            .collect()
    }
}
