// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::engine::Phase;
use crate::errors::EngineError;
use crate::traits::{DagSubmission, ExecutionEngine, RunHandle, StageTemplate, TemplateOutcome};

type PollResult = Result<HashMap<String, Phase>, EngineError>;

/// An in-memory engine that replays scripted poll results.
///
/// Each poll consumes one scripted result; the last one repeats forever.
#[derive(Default)]
pub struct ScriptedEngine {
    script: Mutex<VecDeque<PollResult>>,
    polls: AtomicUsize,
    registered: Mutex<HashSet<String>>,
    ensured: Mutex<Vec<(String, bool)>>,
    submissions: Mutex<Vec<DagSubmission>>,
    template_error: Mutex<Option<EngineError>>,
    submit_error: Mutex<Option<EngineError>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registered_template(self, name: &str) -> Self {
        self.registered.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn fail_templates_with(self, error: EngineError) -> Self {
        *self.template_error.lock().unwrap() = Some(error);
        self
    }

    pub fn fail_submit_with(self, error: EngineError) -> Self {
        *self.submit_error.lock().unwrap() = Some(error);
        self
    }

    pub fn push_phases(&self, phases: &[(&str, Phase)]) {
        let phases = phases
            .iter()
            .map(|(name, phase)| (name.to_string(), phase.clone()))
            .collect();
        self.script.lock().unwrap().push_back(Ok(phases));
    }

    pub fn push_error(&self, error: EngineError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// `(template, force_update)` for every ensure call, in order.
    pub fn ensured(&self) -> Vec<(String, bool)> {
        self.ensured.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<DagSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionEngine for ScriptedEngine {
    async fn ensure_template(
        &self,
        template: &StageTemplate,
        force_update: bool,
    ) -> Result<TemplateOutcome, EngineError> {
        self.ensured
            .lock()
            .unwrap()
            .push((template.name.clone(), force_update));
        if let Some(error) = self.template_error.lock().unwrap().clone() {
            return Err(error);
        }

        let mut registered = self.registered.lock().unwrap();
        if registered.contains(&template.name) {
            if force_update {
                Ok(TemplateOutcome::Recreated)
            } else {
                Err(EngineError::AlreadyExists(template.name.clone()))
            }
        } else {
            registered.insert(template.name.clone());
            Ok(TemplateOutcome::Created)
        }
    }

    async fn submit_dag(&self, submission: &DagSubmission) -> Result<RunHandle, EngineError> {
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push(submission.clone());
        if let Some(error) = self.submit_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(RunHandle(format!(
            "{}{:05}",
            submission.generate_name,
            submissions.len()
        )))
    }

    async fn get_run_phases(&self, _handle: &RunHandle) -> PollResult {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.unwrap_or_else(|| Ok(HashMap::new()))
    }
}
