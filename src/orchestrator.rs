// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end handling of one graph request.
//!
//! ```text
//! GraphRequest → normalize → plan (per run) → register → submit → watch
//! ```
//!
//! A request yields one DAG run for the working set plus one single-node run
//! for each selected node outside it. Every run is planned before anything is
//! submitted, so a [`ValidationError`] means nothing reached the engine.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::backends::TemplateRegistry;
use crate::config::OrchestratorConfig;
use crate::engine::{ExecutionAdapter, SubmittedRun, WorkflowRun};
use crate::errors::{SubmissionError, ValidationError};
use crate::graph::{GraphNormalizer, GraphRequest, WorkingSet};
use crate::plan::{ExecutionPlan, FanOutInstancer, RunContext};
use crate::sink::{EventSender, RunEvent};
use crate::stage::ParentPolicy;
use crate::traits::ExecutionEngine;

/// Outcome of handing one run to the engine.
#[derive(Debug)]
pub enum RunSubmission {
    Submitted(SubmittedRun),
    /// Nodes of the run were already marked `error` with this message.
    Rejected {
        run_id: String,
        error: SubmissionError,
    },
}

impl RunSubmission {
    pub fn run_id(&self) -> &str {
        match self {
            RunSubmission::Submitted(run) => &run.run_id,
            RunSubmission::Rejected { run_id, .. } => run_id,
        }
    }
}

struct PlannedRun {
    context: RunContext,
    working: WorkingSet,
    plan: ExecutionPlan,
}

pub struct Orchestrator {
    policy: ParentPolicy,
    default_bucket: String,
    adapter: ExecutionAdapter,
    events: EventSender,
}

impl Orchestrator {
    pub fn new(
        config: &OrchestratorConfig,
        engine: Arc<dyn ExecutionEngine>,
        templates: Arc<TemplateRegistry>,
        events: EventSender,
    ) -> Self {
        let adapter = ExecutionAdapter::new(engine, templates, config.watch, events.clone())
            .with_force_template_update(config.engine.force_template_update);
        Self {
            policy: config.parent_policy.clone(),
            default_bucket: config.storage.default_bucket.clone(),
            adapter,
            events,
        }
    }

    /// Validate, plan and submit every run of `request` on behalf of `user_id`.
    pub async fn submit_workflow(
        &self,
        user_id: &str,
        request: &GraphRequest,
    ) -> Result<Vec<RunSubmission>, ValidationError> {
        let mut working = GraphNormalizer::normalize_request(request)?;
        let independent = std::mem::take(&mut working.independent);

        let mut planned = vec![self.plan(user_id, working)?];
        for node in independent {
            planned.push(self.plan(user_id, WorkingSet::single(node))?);
        }

        let mut submissions = Vec::with_capacity(planned.len());
        for run in planned {
            submissions.push(self.submit(user_id, run).await);
        }
        Ok(submissions)
    }

    fn plan(&self, user_id: &str, working: WorkingSet) -> Result<PlannedRun, ValidationError> {
        let context = RunContext::new(user_id, new_run_id(), self.default_bucket.clone());
        let plan = FanOutInstancer::new(&self.policy, &context).build(&working)?;
        Ok(PlannedRun {
            context,
            working,
            plan,
        })
    }

    async fn submit(&self, user_id: &str, run: PlannedRun) -> RunSubmission {
        let record = WorkflowRun::new(run.context.run_id.clone(), user_id, &run.working);
        if self.events.send(RunEvent::RunRegistered(Box::new(record))).is_err() {
            tracing::debug!(run_id = %run.context.run_id, "Event receiver closed; run not recorded");
        }

        match self.adapter.submit(&run.context, &run.plan).await {
            Ok(submitted) => RunSubmission::Submitted(submitted),
            Err(error) => RunSubmission::Rejected {
                run_id: run.context.run_id,
                error,
            },
        }
    }
}

/// `YYYYmmdd-HHMMSS-xxxxxxxx`, sortable by submission time.
fn new_run_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().format("%Y%m%d-%H%M%S"), &suffix[..8])
}
