// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! [`ExecutionEngine`] over the Argo Workflows REST API.
//!
//! Endpoints used:
//!
//! * `GET|DELETE /api/v1/workflow-templates/{ns}/{name}`
//! * `POST /api/v1/workflow-templates/{ns}`
//! * `POST /api/v1/workflows/{ns}`
//! * `GET /api/v1/workflows/{ns}/{name}`

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::engine::Phase;
use crate::errors::EngineError;
use crate::observability::messages::engine::TemplateDeleteFailed;
use crate::observability::messages::StructuredLog;
use crate::traits::{DagSubmission, ExecutionEngine, RunHandle, StageTemplate, TemplateOutcome};

const BODY_PREVIEW_LIMIT: usize = 512;
const DAG_TEMPLATE: &str = "main";

#[derive(Clone)]
pub struct ArgoEngine {
    http: reqwest::Client,
    token: String,
    namespace: String,
    url_templates: String,
    url_workflows: String,
}

impl ArgoEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_sec))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| EngineError::Unavailable(format!("could not build HTTP client: {e}")))?;
        let host = config.host.trim_end_matches('/');

        Ok(Self {
            http,
            token: config.token.clone(),
            namespace: config.namespace.clone(),
            url_templates: format!("{host}/api/v1/workflow-templates/{}", config.namespace),
            url_workflows: format!("{host}/api/v1/workflows/{}", config.namespace),
        })
    }

    fn auth(&self, req: RequestBuilder) -> RequestBuilder {
        if self.token.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.token)
        }
    }

    async fn send(&self, req: RequestBuilder, url: &str) -> Result<Response, EngineError> {
        self.auth(req)
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(format!("{url}: {e}")))
    }

    async fn template_exists(&self, name: &str) -> Result<bool, EngineError> {
        let url = format!("{}/{name}", self.url_templates);
        let resp = self.send(self.http.get(&url), &url).await?;
        match parse_json_response(resp, name).await {
            Ok(_) => Ok(true),
            Err(EngineError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete_template(&self, name: &str) -> Result<(), EngineError> {
        let url = format!("{}/{name}", self.url_templates);
        let resp = self.send(self.http.delete(&url), &url).await?;
        parse_json_response(resp, name).await.map(|_| ())
    }

    async fn create_template(&self, template: &StageTemplate) -> Result<(), EngineError> {
        let body = json!({
            "namespace": self.namespace,
            "template": template.definition,
        });
        let url = &self.url_templates;
        let resp = self.send(self.http.post(url).json(&body), url).await?;
        parse_json_response(resp, &template.name).await.map(|_| ())
    }

    /// Argo `Workflow` with a single DAG template referencing the stage templates.
    fn workflow_manifest(&self, submission: &DagSubmission) -> Value {
        let tasks: Vec<Value> = submission
            .tasks
            .iter()
            .map(|task| {
                let parameters: Vec<Value> = task
                    .arguments
                    .iter()
                    .map(|(name, value)| json!({ "name": name, "value": value }))
                    .collect();
                let mut entry = json!({
                    "name": task.name,
                    "templateRef": { "name": task.template, "template": DAG_TEMPLATE },
                    "arguments": { "parameters": parameters },
                });
                if !task.depends_on.is_empty() {
                    entry["dependencies"] = json!(task.depends_on);
                }
                entry
            })
            .collect();

        json!({
            "metadata": {
                "generateName": submission.generate_name,
                "namespace": self.namespace,
                "annotations": submission.annotations,
            },
            "spec": {
                "entrypoint": DAG_TEMPLATE,
                "templates": [{ "name": DAG_TEMPLATE, "dag": { "tasks": tasks } }],
            },
        })
    }
}

#[async_trait]
impl ExecutionEngine for ArgoEngine {
    async fn ensure_template(
        &self,
        template: &StageTemplate,
        force_update: bool,
    ) -> Result<TemplateOutcome, EngineError> {
        let exists = self.template_exists(&template.name).await?;
        if exists && !force_update {
            return Err(EngineError::AlreadyExists(template.name.clone()));
        }

        if exists {
            if let Err(e) = self.delete_template(&template.name).await {
                TemplateDeleteFailed {
                    template: &template.name,
                    error: &e,
                }
                .log();
            }
        }

        self.create_template(template).await?;
        Ok(if exists {
            TemplateOutcome::Recreated
        } else {
            TemplateOutcome::Created
        })
    }

    async fn submit_dag(&self, submission: &DagSubmission) -> Result<RunHandle, EngineError> {
        let body = json!({
            "namespace": self.namespace,
            "workflow": self.workflow_manifest(submission),
        });
        let url = &self.url_workflows;
        tracing::debug!(url = %url, tasks = submission.tasks.len(), "Submitting workflow");

        let resp = self.send(self.http.post(url).json(&body), url).await?;
        let created = parse_json_response(resp, &submission.generate_name).await?;
        created
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .map(|name| RunHandle(name.to_string()))
            .ok_or_else(|| EngineError::Decode("workflow response has no metadata.name".into()))
    }

    async fn get_run_phases(&self, handle: &RunHandle) -> Result<HashMap<String, Phase>, EngineError> {
        let url = format!("{}/{}", self.url_workflows, handle.as_str());
        let resp = self.send(self.http.get(&url), &url).await?;
        let workflow = parse_json_response(resp, handle.as_str()).await?;

        let phases = workflow
            .pointer("/status/nodes")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|nodes| nodes.values())
            .filter_map(|node| {
                let name = node.get("name").and_then(Value::as_str)?;
                let phase = node.get("phase").and_then(Value::as_str).unwrap_or_default();
                Some((name.to_string(), Phase::parse(phase)))
            })
            .collect();
        Ok(phases)
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

/// Map the HTTP status onto [`EngineError`] and decode a successful body.
async fn parse_json_response(resp: Response, subject: &str) -> Result<Value, EngineError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|e| EngineError::Unavailable(format!("{url}: {e}")))?;

    match status {
        s if s.is_success() => {
            if body.trim().is_empty() {
                Ok(Value::Null)
            } else {
                serde_json::from_str(&body)
                    .map_err(|e| EngineError::Decode(format!("{e} | body={}", preview_body(&body))))
            }
        }
        StatusCode::NOT_FOUND => Err(EngineError::NotFound(subject.to_string())),
        StatusCode::CONFLICT => Err(EngineError::AlreadyExists(subject.to_string())),
        s if s.is_server_error() => Err(EngineError::Unavailable(format!(
            "{url} returned {}: {}",
            s.as_u16(),
            preview_body(&body)
        ))),
        s => Err(EngineError::Rejected {
            status: s.as_u16(),
            message: preview_body(&body),
        }),
    }
}
