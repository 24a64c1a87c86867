// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use ngiab_orchestrator::backends::{ArgoEngine, TemplateRegistry};
use ngiab_orchestrator::config::{load_config, OrchestratorConfig};
use ngiab_orchestrator::engine::RunStatus;
use ngiab_orchestrator::errors::OrchestratorError;
use ngiab_orchestrator::graph::GraphRequest;
use ngiab_orchestrator::observability::init_tracing;
use ngiab_orchestrator::orchestrator::{Orchestrator, RunSubmission};
use ngiab_orchestrator::sink::{
    event_channel, notification_channel, InMemoryStatusStore, StatusDispatcher,
};

const DEFAULT_USER: &str = "local";

struct CliArgs {
    request: PathBuf,
    config: Option<PathBuf>,
    user: String,
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <request.(json|yaml)> [--config <file>] [--user <id>]")
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let program = args.first().map(String::as_str).unwrap_or("ngiab-orchestrator");
    let mut request = None;
    let mut config = None;
    let mut user = None;

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" => {
                let value = rest.next().with_context(|| usage(program))?;
                config = Some(PathBuf::from(value));
            }
            "--user" => {
                let value = rest.next().with_context(|| usage(program))?;
                user = Some(value.clone());
            }
            flag if flag.starts_with("--") => bail!("Unknown option '{flag}'\n{}", usage(program)),
            path if request.is_none() => request = Some(PathBuf::from(path)),
            extra => bail!("Unexpected argument '{extra}'\n{}", usage(program)),
        }
    }

    Ok(CliArgs {
        request: request.with_context(|| usage(program))?,
        config,
        user: user.unwrap_or_else(|| DEFAULT_USER.to_string()),
    })
}

fn load_settings(path: Option<&Path>) -> Result<OrchestratorConfig, OrchestratorError> {
    let config = match path {
        Some(path) => load_config(path)?.apply_env_overrides()?,
        None => OrchestratorConfig::from_env()?,
    };
    Ok(config)
}

fn read_request(path: &Path) -> Result<GraphRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    let request = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON request in {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML request in {}", path.display()))?,
    };
    Ok(request)
}

/// Returns whether every run finished in `success`.
async fn run(args: CliArgs) -> Result<bool> {
    let config = load_settings(args.config.as_deref())?;
    let request = read_request(&args.request)?;

    let engine = Arc::new(ArgoEngine::new(&config.engine)?);
    let templates = Arc::new(TemplateRegistry::bundled()?);

    let (events, event_rx) = event_channel();
    let (notifier, mut notification_rx) = notification_channel();
    let store = Arc::new(InMemoryStatusStore::new());
    let dispatcher = StatusDispatcher::new(store)
        .with_notifier(notifier)
        .spawn(event_rx);

    let printer = tokio::spawn(async move {
        while let Some(notification) = notification_rx.recv().await {
            match serde_json::to_string(&notification) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Could not encode notification"),
            }
        }
    });

    let orchestrator = Orchestrator::new(&config, engine, templates, events);
    let submissions = orchestrator.submit_workflow(&args.user, &request).await?;

    let mut all_succeeded = true;
    for submission in submissions {
        match submission {
            RunSubmission::Submitted(run) => {
                let status = run
                    .watcher
                    .await
                    .with_context(|| format!("Watcher for run {} panicked", run.run_id))?;
                tracing::info!(run_id = %run.run_id, status = %status, "Run finished");
                all_succeeded &= status == RunStatus::Success;
            }
            RunSubmission::Rejected { run_id, error } => {
                tracing::error!(run_id = %run_id, error = %error, "Run was not submitted");
                all_succeeded = false;
            }
        }
    }

    // closing the last event sender lets the dispatcher and printer drain and stop
    drop(orchestrator);
    dispatcher.await.context("Status dispatcher panicked")?;
    printer.await.context("Notification printer panicked")?;

    Ok(all_succeeded)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let outcome = match parse_args(&args) {
        Ok(cli) => run(cli).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
