// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hands an [`ExecutionPlan`] to the engine and starts watching it.
//!
//! Submission is synchronous to the caller: templates are ensured one at a
//! time, then the DAG is submitted. Only an accepted DAG gets a watcher. A
//! rejected one has every owning node marked `error` with the failure message.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backends::TemplateRegistry;
use crate::config::WatchOptions;
use crate::engine::{NodeStatus, RunStatus, StatusWatcher};
use crate::errors::{EngineError, SubmissionError};
use crate::observability::messages::engine::{DagSubmitted, SubmissionFailed, TemplateEnsured};
use crate::observability::messages::StructuredLog;
use crate::plan::{ExecutionPlan, RunContext};
use crate::sink::{EventSender, RunEvent};
use crate::traits::{DagSubmission, ExecutionEngine, RunHandle, TemplateOutcome};

/// An accepted run and the task watching it.
#[derive(Debug)]
pub struct SubmittedRun {
    pub run_id: String,
    pub handle: RunHandle,
    pub watcher: JoinHandle<RunStatus>,
    pub cancel: CancellationToken,
}

pub struct ExecutionAdapter {
    engine: Arc<dyn ExecutionEngine>,
    templates: Arc<TemplateRegistry>,
    force_template_update: bool,
    watch: WatchOptions,
    events: EventSender,
}

impl ExecutionAdapter {
    pub fn new(
        engine: Arc<dyn ExecutionEngine>,
        templates: Arc<TemplateRegistry>,
        watch: WatchOptions,
        events: EventSender,
    ) -> Self {
        Self {
            engine,
            templates,
            force_template_update: false,
            watch,
            events,
        }
    }

    pub fn with_force_template_update(mut self, force: bool) -> Self {
        self.force_template_update = force;
        self
    }

    /// Ensure templates, submit the DAG and spawn its watcher.
    ///
    /// On error every node in `plan.tasks_by_node` has already been sent an
    /// `error` status carrying the error message.
    pub async fn submit(
        &self,
        context: &RunContext,
        plan: &ExecutionPlan,
    ) -> Result<SubmittedRun, SubmissionError> {
        match self.try_submit(context, plan).await {
            Ok(handle) => Ok(self.start_watcher(context, plan, handle)),
            Err(e) => {
                SubmissionFailed {
                    run_id: &context.run_id,
                    node_count: plan.tasks_by_node.len(),
                    error: &e,
                }
                .log();
                let message = e.to_string();
                for node_id in plan.node_ids() {
                    self.send(RunEvent::node_status(
                        context.run_id.clone(),
                        node_id.clone(),
                        NodeStatus::Error,
                        message.clone(),
                    ));
                }
                Err(e)
            }
        }
    }

    async fn try_submit(
        &self,
        context: &RunContext,
        plan: &ExecutionPlan,
    ) -> Result<RunHandle, SubmissionError> {
        if plan.is_empty() {
            return Err(SubmissionError::EmptyPlan);
        }

        for name in plan.templates() {
            self.ensure_template(name).await?;
        }

        let submission = DagSubmission::from_plan(&context.run_id, &context.user_id, plan);
        let handle = self
            .engine
            .submit_dag(&submission)
            .await
            .map_err(SubmissionError::Rejected)?;

        DagSubmitted {
            run_id: &context.run_id,
            engine_handle: handle.as_str(),
            task_count: submission.tasks.len(),
        }
        .log();
        self.send(RunEvent::Submitted {
            run_id: context.run_id.clone(),
            engine_handle: handle.clone(),
        });
        Ok(handle)
    }

    async fn ensure_template(&self, name: &str) -> Result<(), SubmissionError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| SubmissionError::Template {
                template: name.to_string(),
                source: EngineError::InvalidTemplate {
                    name: name.to_string(),
                    reason: "no bundled definition".to_string(),
                },
            })?;

        let outcome = match self
            .engine
            .ensure_template(template, self.force_template_update)
            .await
        {
            Ok(outcome) => outcome,
            Err(EngineError::AlreadyExists(_)) => TemplateOutcome::AlreadyPresent,
            Err(source) => {
                return Err(SubmissionError::Template {
                    template: name.to_string(),
                    source,
                })
            }
        };

        TemplateEnsured {
            template: name,
            outcome,
        }
        .log();
        Ok(())
    }

    fn start_watcher(&self, context: &RunContext, plan: &ExecutionPlan, handle: RunHandle) -> SubmittedRun {
        let artifact_location = format!(
            "s3://{}/{}/{}/{}",
            context.default_bucket, context.user_id, context.run_id, handle
        );
        let watcher = StatusWatcher::new(
            self.engine.clone(),
            context.run_id.clone(),
            handle.clone(),
            plan.tasks_by_node.clone(),
            self.watch,
            self.events.clone(),
        )
        .with_artifact_location(artifact_location);
        let cancel = watcher.cancellation_token();

        SubmittedRun {
            run_id: context.run_id.clone(),
            handle,
            watcher: watcher.spawn(),
            cancel,
        }
    }

    fn send(&self, event: RunEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Event receiver closed; dropping run event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::ScriptedEngine;
    use crate::engine::Phase;
    use crate::graph::{GraphNode, WorkingSet};
    use crate::plan::FanOutInstancer;
    use crate::sink::{event_channel, EventReceiver};
    use crate::stage::ParentPolicy;
    use std::time::Duration;

    fn options() -> WatchOptions {
        WatchOptions {
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
        }
    }

    fn context() -> RunContext {
        RunContext::new("alice", "r1", "test-ngen")
    }

    fn plan(node: GraphNode) -> ExecutionPlan {
        let policy = ParentPolicy::default();
        let context = context();
        FanOutInstancer::new(&policy, &context)
            .build(&WorkingSet::single(node))
            .unwrap()
    }

    fn adapter(engine: Arc<ScriptedEngine>) -> (ExecutionAdapter, EventReceiver) {
        let (tx, rx) = event_channel();
        let templates = Arc::new(TemplateRegistry::bundled().unwrap());
        (ExecutionAdapter::new(engine, templates, options(), tx), rx)
    }

    fn drain(receiver: &mut EventReceiver) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_existing_template_counts_as_ensured() {
        let engine = Arc::new(ScriptedEngine::new().with_registered_template("ngiab-teehr"));
        engine.push_phases(&[("t-evaluation-eval-00", Phase::Succeeded)]);
        let (adapter, mut rx) = adapter(engine.clone());

        let run = adapter
            .submit(&context(), &plan(GraphNode::new("eval", "evaluation")))
            .await
            .unwrap();

        assert_eq!(run.handle.as_str(), "ngiab-teehr-00001");
        assert_eq!(run.watcher.await.unwrap(), RunStatus::Success);
        assert_eq!(engine.ensured(), vec![("ngiab-teehr".to_string(), false)]);

        let events = drain(&mut rx);
        assert!(matches!(&events[0], RunEvent::Submitted { engine_handle, .. } if engine_handle == &run.handle));
        assert!(events.iter().any(|event| matches!(
            event,
            RunEvent::RunCompleted { artifact_location, .. }
                if artifact_location == "s3://test-ngen/alice/r1/ngiab-teehr-00001"
        )));
    }

    #[tokio::test]
    async fn test_force_update_is_passed_through() {
        let engine = Arc::new(ScriptedEngine::new().with_registered_template("ngiab-run"));
        engine.push_phases(&[("t-model-run-run-00", Phase::Succeeded)]);
        let (adapter, _rx) = adapter(engine.clone());
        let adapter = adapter.with_force_template_update(true);

        let run = adapter
            .submit(&context(), &plan(GraphNode::new("run", "model_run")))
            .await
            .unwrap();
        run.watcher.await.unwrap();

        assert_eq!(engine.ensured(), vec![("ngiab-run".to_string(), true)]);
    }

    #[tokio::test]
    async fn test_template_failure_marks_nodes_error_without_submitting() {
        let engine = Arc::new(
            ScriptedEngine::new().fail_templates_with(EngineError::Unavailable("refused".into())),
        );
        let (adapter, mut rx) = adapter(engine.clone());

        let err = adapter
            .submit(&context(), &plan(GraphNode::new("run", "model_run")))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Template { ref template, .. } if template == "ngiab-run"));
        assert!(engine.submissions().is_empty());
        assert_eq!(engine.poll_count(), 0);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            RunEvent::NodeStatus { node_id, status: NodeStatus::Error, message, .. }
                if node_id == "run" && message.contains("refused")
        ));
    }

    #[tokio::test]
    async fn test_rejected_dag_starts_no_watcher() {
        let engine = Arc::new(ScriptedEngine::new().fail_submit_with(EngineError::Rejected {
            status: 400,
            message: "bad dag".into(),
        }));
        let (adapter, mut rx) = adapter(engine.clone());

        let err = adapter
            .submit(&context(), &plan(GraphNode::new("run", "model_run")))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Rejected(_)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(engine.poll_count(), 0);
        assert!(drain(&mut rx)
            .iter()
            .all(|event| matches!(event, RunEvent::NodeStatus { status: NodeStatus::Error, .. })));
    }

    #[tokio::test]
    async fn test_empty_plan_is_rejected() {
        let engine = Arc::new(ScriptedEngine::new());
        let (adapter, _rx) = adapter(engine.clone());

        let err = adapter
            .submit(&context(), &ExecutionPlan::default())
            .await
            .unwrap_err();

        assert_eq!(err, SubmissionError::EmptyPlan);
        assert!(engine.ensured().is_empty());
    }
}
