// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

use crate::engine::Phase;
use crate::errors::EngineError;
use crate::plan::{ExecutionPlan, TaskInstance};

/// Generate-name prefix for multi-task runs.
pub const CHAIN_NAME_PREFIX: &str = "ngiab-chain-";

/// Engine-assigned identity of a submitted run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunHandle(pub String);

impl RunHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RunHandle {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bundled stage template definition, keyed by template name.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTemplate {
    pub name: String,
    /// Engine-native manifest, opaque to the orchestrator
    pub definition: serde_json::Value,
}

/// How a stage template ended up registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOutcome {
    Created,
    AlreadyPresent,
    Recreated,
}

impl Display for TemplateOutcome {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let text = match self {
            TemplateOutcome::Created => "created",
            TemplateOutcome::AlreadyPresent => "already present",
            TemplateOutcome::Recreated => "recreated",
        };
        f.write_str(text)
    }
}

/// Everything the engine needs to run one DAG.
#[derive(Debug, Clone, PartialEq)]
pub struct DagSubmission {
    pub run_id: String,
    pub generate_name: String,
    pub annotations: BTreeMap<String, String>,
    pub tasks: Vec<TaskInstance>,
}

impl DagSubmission {
    /// Single-task runs are named after their template, larger runs after the chain.
    pub fn from_plan(run_id: &str, user_id: &str, plan: &ExecutionPlan) -> Self {
        let generate_name = match plan.instances.as_slice() {
            [only] => format!("{}-", only.template),
            _ => CHAIN_NAME_PREFIX.to_string(),
        };
        let annotations = BTreeMap::from([
            ("ngiab/run-id".to_string(), run_id.to_string()),
            ("ngiab/user".to_string(), user_id.to_string()),
        ]);

        Self {
            run_id: run_id.to_string(),
            generate_name,
            annotations,
            tasks: plan.instances.clone(),
        }
    }
}

/// Boundary to the external batch-workflow engine.
///
/// The engine is a black box: it runs a DAG of named tasks and reports a
/// phase string per task.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Register `template` unless it is already present.
    ///
    /// Returns [`EngineError::AlreadyExists`] when the template is already
    /// registered and `force_update` is off. With `force_update` an existing
    /// template is replaced.
    async fn ensure_template(
        &self,
        template: &StageTemplate,
        force_update: bool,
    ) -> Result<TemplateOutcome, EngineError>;

    /// Submit a DAG; the returned handle identifies the run from then on.
    async fn submit_dag(&self, submission: &DagSubmission) -> Result<RunHandle, EngineError>;

    /// Phase of every task the engine knows about, keyed by its (possibly
    /// qualified) task name.
    async fn get_run_phases(&self, handle: &RunHandle) -> Result<HashMap<String, Phase>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::DatasetPointer;
    use crate::stage::StageTag;

    fn instance(name: &str, template: &str) -> TaskInstance {
        TaskInstance {
            name: name.to_string(),
            stage_tag: StageTag::Other,
            template: template.to_string(),
            source_node_id: name.to_string(),
            depends_on: vec![],
            arguments: BTreeMap::new(),
            produced_pointer: DatasetPointer::default(),
        }
    }

    #[test]
    fn test_generate_name_for_single_and_chain() {
        let mut plan = ExecutionPlan::default();
        plan.instances.push(instance("t-a-00", "ngiab-teehr"));
        let single = DagSubmission::from_plan("r1", "alice", &plan);
        assert_eq!(single.generate_name, "ngiab-teehr-");
        assert_eq!(single.annotations["ngiab/user"], "alice");

        plan.instances.push(instance("t-b-00", "ngiab-run"));
        let chain = DagSubmission::from_plan("r1", "alice", &plan);
        assert_eq!(chain.generate_name, "ngiab-chain-");
        assert_eq!(chain.tasks.len(), 2);
    }
}
