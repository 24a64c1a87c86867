// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-out / fan-in expansion of graph nodes into task instances.
//!
//! Layers are walked in order so every parent instance exists before its
//! children are planned. For each node:
//!
//! * **Fan-out**: a dataset-consuming stage with allowed parent instances gets
//!   one instance per parent instance. Each depends only on that parent and
//!   inherits its dataset pointer.
//! * **Fan-in / single**: anything else gets one instance depending on every
//!   allowed parent instance. It inherits a pointer only when there is exactly
//!   one parent instance.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::errors::ValidationError;
use crate::graph::{compute_layers, GraphNode, WorkingSet};
use crate::observability::messages::graph::InstancesPlanned;
use crate::observability::messages::StructuredLog;
use crate::plan::{DatasetPointer, ExecutionPlan, ParameterResolver, RunContext, TaskInstance};
use crate::stage::{classify, is_dataset_consumer, ParentPolicy, StageTag};

static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9-]+").expect("slug pattern is valid"));

/// Engine-safe fragment: runs of other characters become `-`, trimmed and
/// lowercased, `n` when nothing is left.
pub fn slug(text: &str) -> String {
    let replaced = NON_SLUG.replace_all(text, "-");
    let trimmed = replaced.trim_matches('-').to_lowercase();
    if trimmed.is_empty() {
        "n".to_string()
    } else {
        trimmed
    }
}

pub struct FanOutInstancer<'a> {
    policy: &'a ParentPolicy,
    resolver: ParameterResolver<'a>,
}

impl<'a> FanOutInstancer<'a> {
    pub fn new(policy: &'a ParentPolicy, context: &'a RunContext) -> Self {
        Self {
            policy,
            resolver: ParameterResolver::new(context),
        }
    }

    pub fn build(&self, working: &WorkingSet) -> Result<ExecutionPlan, ValidationError> {
        let layers = compute_layers(&working.graph).into_ordered()?;
        let parents_of = working.graph.build_reverse_dependencies();
        let sinks: HashSet<String> = working.graph.sinks().into_iter().collect();
        let tags: HashMap<&str, StageTag> = working
            .nodes
            .values()
            .map(|node| (node.id.as_str(), classify(node.kind())))
            .collect();

        let mut instances: Vec<TaskInstance> = Vec::new();
        let mut index_by_name: HashMap<String, usize> = HashMap::new();
        let mut tasks_by_node: IndexMap<String, Vec<String>> = IndexMap::new();

        for node_id in layers.iter().flatten() {
            let node = working
                .nodes
                .get(node_id)
                .ok_or_else(|| ValidationError::UnknownNode {
                    node_id: node_id.clone(),
                })?;
            let tag = tags[node_id.as_str()];
            let is_sink = sinks.contains(node_id);

            let parent_tags: Vec<(&str, StageTag)> = parents_of
                .get(node_id)
                .into_iter()
                .flatten()
                .map(|parent| (parent.as_str(), tags[parent.as_str()]))
                .collect();
            let parent_instances: Vec<&TaskInstance> = self
                .policy
                .select_parents(tag, &parent_tags)
                .into_iter()
                .flat_map(|parent| tasks_by_node.get(parent).into_iter().flatten())
                .map(|name| &instances[index_by_name[name]])
                .collect();

            let mut planned: Vec<TaskInstance> = Vec::new();
            if is_dataset_consumer(tag) && !parent_instances.is_empty() {
                for (index, parent) in parent_instances.iter().enumerate() {
                    let name = unique_name(node, index, &index_by_name, &planned);
                    planned.push(self.instance(
                        node,
                        tag,
                        name,
                        is_sink,
                        vec![parent.name.clone()],
                        Some(&parent.produced_pointer),
                    )?);
                }
            } else {
                let inherited = match parent_instances.as_slice() {
                    [only] => Some(&only.produced_pointer),
                    _ => None,
                };
                let depends_on = parent_instances.iter().map(|p| p.name.clone()).collect();
                let name = unique_name(node, 0, &index_by_name, &planned);
                planned.push(self.instance(node, tag, name, is_sink, depends_on, inherited)?);
            }

            let names = planned.iter().map(|instance| instance.name.clone()).collect();
            for instance in planned {
                index_by_name.insert(instance.name.clone(), instances.len());
                instances.push(instance);
            }
            tasks_by_node.insert(node_id.clone(), names);
        }

        InstancesPlanned {
            run_id: &self.resolver.context().run_id,
            node_count: tasks_by_node.len(),
            instance_count: instances.len(),
        }
        .log();

        Ok(ExecutionPlan {
            instances,
            tasks_by_node,
        })
    }

    fn instance(
        &self,
        node: &GraphNode,
        tag: StageTag,
        name: String,
        is_sink: bool,
        depends_on: Vec<String>,
        inherited: Option<&DatasetPointer>,
    ) -> Result<TaskInstance, ValidationError> {
        let resolved = self.resolver.resolve(node, tag, &name, is_sink, inherited)?;
        Ok(TaskInstance {
            name,
            stage_tag: tag,
            template: tag.template_name().to_string(),
            source_node_id: node.id.clone(),
            depends_on,
            arguments: resolved.arguments,
            produced_pointer: resolved.produced_pointer,
        })
    }
}

/// `t-<label>-<id>-<index>`, suffixed when two nodes slug to the same name.
fn unique_name(
    node: &GraphNode,
    index: usize,
    taken: &HashMap<String, usize>,
    planned: &[TaskInstance],
) -> String {
    let base = format!("t-{}-{}-{:02}", slug(&node.stage_label), slug(&node.id), index);
    let is_taken = |candidate: &str| {
        taken.contains_key(candidate) || planned.iter().any(|p| p.name == candidate)
    };

    if !is_taken(&base) {
        return base;
    }
    (2..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, GraphNormalizer};

    fn context() -> RunContext {
        RunContext::new("alice", "run-1", "test-ngen")
    }

    fn plan(nodes: Vec<GraphNode>, edges: Vec<Edge>) -> ExecutionPlan {
        let working = GraphNormalizer::normalize(&nodes, &edges, &[]).unwrap();
        let policy = ParentPolicy::default();
        let ctx = context();
        FanOutInstancer::new(&policy, &ctx).build(&working).unwrap()
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Pre Process"), "pre-process");
        assert_eq!(slug("  NGIAB run!! "), "ngiab-run");
        assert_eq!(slug("--a__b--"), "a-b");
        assert_eq!(slug("***"), "n");
        assert_eq!(slug(""), "n");
    }

    #[test]
    fn test_chain_depends_on_previous_instance() {
        let plan = plan(
            vec![
                GraphNode::new("A", "preprocess"),
                GraphNode::new("B", "calibration-config"),
                GraphNode::new("C", "calibration-run"),
            ],
            vec![Edge::new("A", "B"), Edge::new("B", "C")],
        );

        assert_eq!(plan.len(), 3);
        let names: Vec<&str> = plan.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "t-preprocess-a-00",
                "t-calibration-config-b-00",
                "t-calibration-run-c-00"
            ]
        );
        assert!(plan.instances[0].depends_on.is_empty());
        assert_eq!(plan.instances[1].depends_on, vec!["t-preprocess-a-00"]);
        assert_eq!(plan.instances[2].depends_on, vec!["t-calibration-config-b-00"]);

        // calibration-run reads the archive calibration-config produced
        let cal_pointer = &plan.instances[1].produced_pointer;
        assert_eq!(plan.instances[2].arguments["input_key"], cal_pointer.object_key);
        assert_eq!(
            plan.instances[2].arguments["final_prefix"],
            "alice/run-1/{{workflow.name}}/final/t-calibration-run-c-00"
        );
        assert_eq!(plan.instances[1].arguments["final_prefix"], "");
    }

    #[test]
    fn test_consumer_fans_out_per_parent_instance() {
        let plan = plan(
            vec![
                GraphNode::new("P", "preprocess"),
                GraphNode::new("C1", "calibration-config"),
                GraphNode::new("C2", "calibration-config"),
                GraphNode::new("R", "ngiab run"),
            ],
            vec![
                Edge::new("P", "C1"),
                Edge::new("P", "C2"),
                Edge::new("C1", "R"),
                Edge::new("C2", "R"),
            ],
        );

        let runs: Vec<&TaskInstance> = plan.instances_for("R").collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].depends_on, vec!["t-calibration-config-c1-00"]);
        assert_eq!(runs[1].depends_on, vec!["t-calibration-config-c2-00"]);
        assert_ne!(runs[0].arguments["output_prefix"], runs[1].arguments["output_prefix"]);
        assert_ne!(runs[0].arguments["input_key"], runs[1].arguments["input_key"]);
        assert_eq!(plan.tasks_by_node["R"], vec!["t-ngiab-run-r-00", "t-ngiab-run-r-01"]);
    }

    #[test]
    fn test_non_consumer_fans_in() {
        let plan = plan(
            vec![
                GraphNode::new("A", "preprocess"),
                GraphNode::new("B", "preprocess"),
                GraphNode::new("N", "notify"),
            ],
            vec![Edge::new("A", "N"), Edge::new("B", "N")],
        );

        let notify: Vec<&TaskInstance> = plan.instances_for("N").collect();
        assert_eq!(notify.len(), 1);
        assert_eq!(
            notify[0].depends_on,
            vec!["t-preprocess-a-00", "t-preprocess-b-00"]
        );
        assert_eq!(notify[0].template, "ngiab-run");
        assert!(notify[0].produced_pointer.is_empty());
    }

    #[test]
    fn test_highest_preference_parent_wins() {
        let plan = plan(
            vec![
                GraphNode::new("P", "preprocess"),
                GraphNode::new("CR", "calibration-run"),
                GraphNode::new("R", "ngiab run"),
            ],
            vec![Edge::new("P", "R"), Edge::new("CR", "R")],
        );

        let runs: Vec<&TaskInstance> = plan.instances_for("R").collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].depends_on, vec!["t-calibration-run-cr-00"]);
    }

    #[test]
    fn test_every_dependency_is_planned_earlier() {
        let plan = plan(
            vec![
                GraphNode::new("P", "preprocess"),
                GraphNode::new("C1", "calibration-config"),
                GraphNode::new("C2", "calibration-config"),
                GraphNode::new("K", "calibration-run"),
                GraphNode::new("R", "ngiab run"),
                GraphNode::new("E", "teehr"),
            ],
            vec![
                Edge::new("P", "C1"),
                Edge::new("P", "C2"),
                Edge::new("C1", "K"),
                Edge::new("C2", "K"),
                Edge::new("K", "R"),
                Edge::new("R", "E"),
            ],
        );

        for (position, instance) in plan.instances.iter().enumerate() {
            for dependency in &instance.depends_on {
                let dep_position = plan
                    .instances
                    .iter()
                    .position(|i| &i.name == dependency)
                    .unwrap();
                assert!(dep_position < position);
            }
        }
        assert_eq!(plan.instances_for("E").count(), 2);
    }

    #[test]
    fn test_colliding_slugs_get_suffix() {
        let plan = plan(
            vec![
                GraphNode::new("a b", "preprocess"),
                GraphNode::new("a_b", "preprocess"),
            ],
            vec![],
        );

        let names: Vec<&str> = plan.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["t-preprocess-a-b-00", "t-preprocess-a-b-00-2"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let nodes = vec![GraphNode::new("A", "other"), GraphNode::new("B", "other")];
        let edges = vec![Edge::new("A", "B"), Edge::new("B", "A")];
        let working = GraphNormalizer::normalize(&nodes, &edges, &[]).unwrap();
        let policy = ParentPolicy::default();
        let ctx = context();

        let err = FanOutInstancer::new(&policy, &ctx).build(&working).unwrap_err();
        assert!(matches!(err, ValidationError::CyclicSubgraph { .. }));
    }
}
