// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-instance argument resolution.
//!
//! Arguments are layered, later layers winning:
//!
//! 1. stage defaults
//! 2. non-empty node config values (unknown keys pass through)
//! 3. computed output locations
//! 4. input dataset fields for stages that consume a dataset

use std::collections::BTreeMap;

use crate::errors::ValidationError;
use crate::graph::GraphNode;
use crate::plan::{parse_s3_uri, DatasetPointer};
use crate::stage::{is_dataset_consumer, StageTag};

/// Engine placeholder replaced with the engine-assigned run name at execution time.
pub const ENGINE_RUN_NAME_PLACEHOLDER: &str = "{{workflow.name}}";

const OUTPUT_BUCKET: &str = "output_bucket";
const OUTPUT_PREFIX: &str = "output_prefix";
const FINAL_PREFIX: &str = "final_prefix";
const OUTPUT_NAME: &str = "output_name";
const INPUT_BUCKET: &str = "input_bucket";
const INPUT_KEY: &str = "input_key";
const INPUT_S3_KEY: &str = "input_s3_key";
const INPUT_S3_URL: &str = "input_s3_url";

const PREPARED_CALIBRATION_ARCHIVE: &str = "calibration-prepared.tgz";

/// Identity of the run the instances belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub user_id: String,
    pub run_id: String,
    pub default_bucket: String,
}

impl RunContext {
    pub fn new(
        user_id: impl Into<String>,
        run_id: impl Into<String>,
        default_bucket: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            run_id: run_id.into(),
            default_bucket: default_bucket.into(),
        }
    }

    /// `<user>/<runId>/<engine-run-name>`
    pub fn output_base(&self) -> String {
        format!(
            "{}/{}/{}",
            self.user_id, self.run_id, ENGINE_RUN_NAME_PLACEHOLDER
        )
    }
}

/// Arguments for one instance plus the dataset it hands downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub arguments: BTreeMap<String, String>,
    pub produced_pointer: DatasetPointer,
}

fn stage_defaults(tag: StageTag) -> &'static [(&'static str, &'static str)] {
    match tag {
        StageTag::Preprocess => &[
            ("selector_type", "gage"),
            ("selector_value", "01359139"),
            ("vpu", ""),
            ("start_date", "2020-01-01"),
            ("end_date", "2020-01-15"),
            ("output_name", "ngiab"),
            ("source", "nwm"),
            ("debug", "false"),
            ("all", "false"),
            ("subset", "true"),
            ("forcings", "true"),
            ("realization", "true"),
            ("run", "false"),
            ("validate", "false"),
        ],
        StageTag::CalibrationConfig => &[
            ("input_subdir", "ngiab"),
            ("gage", "01359139"),
            ("iterations", "100"),
            ("warmup", "365"),
            ("calibration_ratio", "0.5"),
            ("force", "false"),
            ("debug", "false"),
            ("vpu", ""),
        ],
        StageTag::CalibrationRun => &[("input_subdir", "ngiab")],
        StageTag::ModelRun => &[
            ("input_subdir", "ngiab"),
            ("ngen_np", "8"),
            ("image_ngen", "awiciroh/ciroh-ngen-image:latest"),
        ],
        StageTag::Evaluation => &[
            ("teehr_inputs_subdir", "outputs"),
            ("teehr_results_subdir", "teehr"),
            ("teehr_args", ""),
            ("image_teehr", "awiciroh/ngiab-teehr:x86"),
        ],
        StageTag::Other => &[],
    }
}

pub struct ParameterResolver<'a> {
    context: &'a RunContext,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(context: &'a RunContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RunContext {
        self.context
    }

    /// Resolve the arguments of one instance of `node`.
    ///
    /// `inherited` is the pointer of the single upstream instance this one
    /// follows, if any. An empty inherited pointer counts as none.
    pub fn resolve(
        &self,
        node: &GraphNode,
        tag: StageTag,
        instance_name: &str,
        is_sink: bool,
        inherited: Option<&DatasetPointer>,
    ) -> Result<ResolvedParams, ValidationError> {
        let mut arguments: BTreeMap<String, String> = stage_defaults(tag)
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        arguments.insert(OUTPUT_BUCKET.into(), self.context.default_bucket.clone());

        if tag == StageTag::CalibrationConfig {
            if let Some(selector) = non_empty(node, "selector_value") {
                arguments.insert("gage".into(), selector.to_string());
            }
        }

        for (key, value) in &node.config {
            if !value.is_empty() {
                arguments.insert(key.clone(), value.clone());
            }
        }

        let base = non_empty(node, OUTPUT_PREFIX)
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.context.output_base());
        let output_prefix = format!("{base}/{instance_name}");
        let final_prefix = if is_sink {
            format!("{base}/final/{instance_name}")
        } else {
            String::new()
        };
        arguments.insert(OUTPUT_PREFIX.into(), output_prefix.clone());
        arguments.insert(FINAL_PREFIX.into(), final_prefix);

        if is_dataset_consumer(tag) {
            let input = self.input_pointer(node, inherited)?;
            arguments.insert(INPUT_BUCKET.into(), input.store_bucket);
            arguments.insert(INPUT_KEY.into(), input.object_key.clone());
            arguments.insert(INPUT_S3_KEY.into(), input.object_key);
        }

        let output_bucket = arguments.get(OUTPUT_BUCKET).cloned().unwrap_or_default();
        let produced_pointer = match tag {
            StageTag::Preprocess => {
                let output_name = arguments
                    .get(OUTPUT_NAME)
                    .map(String::as_str)
                    .unwrap_or("ngiab");
                DatasetPointer::new(output_bucket, format!("{output_prefix}/{output_name}.tgz"))
            }
            StageTag::CalibrationConfig => DatasetPointer::new(
                output_bucket,
                format!("{output_prefix}/{PREPARED_CALIBRATION_ARCHIVE}"),
            ),
            _ => inherited.cloned().unwrap_or_default(),
        };

        Ok(ResolvedParams {
            arguments,
            produced_pointer,
        })
    }

    /// Inherited pointer, else `input_s3_url`, else explicit bucket/key config.
    fn input_pointer(
        &self,
        node: &GraphNode,
        inherited: Option<&DatasetPointer>,
    ) -> Result<DatasetPointer, ValidationError> {
        if let Some(pointer) = inherited.filter(|pointer| !pointer.is_empty()) {
            return Ok(pointer.clone());
        }

        if let Some(uri) = non_empty(node, INPUT_S3_URL) {
            return parse_s3_uri(uri).map_err(|reason| ValidationError::MalformedPointerUri {
                node_id: node.id.clone(),
                uri: uri.to_string(),
                reason,
            });
        }

        let bucket = non_empty(node, INPUT_BUCKET).unwrap_or(self.context.default_bucket.as_str());
        let key = non_empty(node, INPUT_KEY)
            .or_else(|| non_empty(node, INPUT_S3_KEY))
            .unwrap_or_default();
        Ok(DatasetPointer::new(bucket, key))
    }
}

fn non_empty<'n>(node: &'n GraphNode, key: &str) -> Option<&'n str> {
    node.config
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RunContext {
        RunContext::new("alice", "20250101-120000-abcd1234", "test-ngen")
    }

    #[test]
    fn test_preprocess_defaults_and_produced_pointer() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);
        let node = GraphNode::new("prep", "pre-process");

        let resolved = resolver
            .resolve(&node, StageTag::Preprocess, "t-pre-process-prep-00", false, None)
            .unwrap();

        let args = &resolved.arguments;
        assert_eq!(args["selector_type"], "gage");
        assert_eq!(args["output_bucket"], "test-ngen");
        assert_eq!(
            args["output_prefix"],
            "alice/20250101-120000-abcd1234/{{workflow.name}}/t-pre-process-prep-00"
        );
        assert_eq!(args["final_prefix"], "");
        assert!(!args.contains_key("input_key"));

        assert_eq!(resolved.produced_pointer.store_bucket, "test-ngen");
        assert_eq!(
            resolved.produced_pointer.object_key,
            "alice/20250101-120000-abcd1234/{{workflow.name}}/t-pre-process-prep-00/ngiab.tgz"
        );
    }

    #[test]
    fn test_config_overrides_defaults_and_passes_unknown_keys() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);
        let node = GraphNode::new("prep", "preprocess")
            .with_config("start_date", "2021-06-01")
            .with_config("output_name", "basin")
            .with_config("end_date", "")
            .with_config("custom_flag", "on");

        let resolved = resolver
            .resolve(&node, StageTag::Preprocess, "t-x-00", false, None)
            .unwrap();

        assert_eq!(resolved.arguments["start_date"], "2021-06-01");
        assert_eq!(resolved.arguments["end_date"], "2020-01-15");
        assert_eq!(resolved.arguments["custom_flag"], "on");
        assert!(resolved.produced_pointer.object_key.ends_with("/t-x-00/basin.tgz"));
    }

    #[test]
    fn test_inherited_pointer_wins_over_config() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);
        let node = GraphNode::new("cal", "calibration-config")
            .with_config("input_s3_url", "s3://other/ignored.tgz");
        let upstream = DatasetPointer::new("test-ngen", "alice/r/prep/ngiab.tgz");

        let resolved = resolver
            .resolve(
                &node,
                StageTag::CalibrationConfig,
                "t-cal-00",
                false,
                Some(&upstream),
            )
            .unwrap();

        assert_eq!(resolved.arguments["input_bucket"], "test-ngen");
        assert_eq!(resolved.arguments["input_key"], "alice/r/prep/ngiab.tgz");
        assert_eq!(resolved.arguments["input_s3_key"], "alice/r/prep/ngiab.tgz");
        assert!(resolved
            .produced_pointer
            .object_key
            .ends_with("/t-cal-00/calibration-prepared.tgz"));
    }

    #[test]
    fn test_input_from_uri_then_explicit_keys() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);

        let from_uri = GraphNode::new("run", "ngiab run")
            .with_config("input_s3_url", "s3://datasets//basins/one.tgz");
        let resolved = resolver
            .resolve(&from_uri, StageTag::ModelRun, "t-run-00", true, None)
            .unwrap();
        assert_eq!(resolved.arguments["input_bucket"], "datasets");
        assert_eq!(resolved.arguments["input_key"], "basins/one.tgz");

        let from_keys = GraphNode::new("run", "ngiab run").with_config("input_s3_key", "/k.tgz");
        let resolved = resolver
            .resolve(&from_keys, StageTag::ModelRun, "t-run-00", true, None)
            .unwrap();
        assert_eq!(resolved.arguments["input_bucket"], "test-ngen");
        assert_eq!(resolved.arguments["input_key"], "k.tgz");
    }

    #[test]
    fn test_malformed_uri_is_rejected() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);
        let node = GraphNode::new("run", "ngiab run").with_config("input_s3_url", "not-a-uri");

        let err = resolver
            .resolve(&node, StageTag::ModelRun, "t-run-00", true, None)
            .unwrap_err();

        assert!(matches!(
            err,
            ValidationError::MalformedPointerUri { ref node_id, .. } if node_id == "run"
        ));
    }

    #[test]
    fn test_user_output_prefix_keeps_instance_suffix() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);
        let node = GraphNode::new("run", "ngiab run").with_config("output_prefix", "custom/out/");

        let resolved = resolver
            .resolve(&node, StageTag::ModelRun, "t-run-01", true, None)
            .unwrap();

        assert_eq!(resolved.arguments["output_prefix"], "custom/out/t-run-01");
        assert_eq!(resolved.arguments["final_prefix"], "custom/out/final/t-run-01");
    }

    #[test]
    fn test_model_run_propagates_inherited_pointer() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);
        let node = GraphNode::new("run", "ngiab run");
        let upstream = DatasetPointer::new("b", "k.tgz");

        let resolved = resolver
            .resolve(&node, StageTag::ModelRun, "t-run-00", false, Some(&upstream))
            .unwrap();

        assert_eq!(resolved.produced_pointer, upstream);
        assert_eq!(resolved.arguments["ngen_np"], "8");
    }

    #[test]
    fn test_calibration_gage_falls_back_to_selector_value() {
        let ctx = context();
        let resolver = ParameterResolver::new(&ctx);
        let node = GraphNode::new("cal", "calibration-config").with_config("selector_value", "0123");

        let resolved = resolver
            .resolve(&node, StageTag::CalibrationConfig, "t-cal-00", false, None)
            .unwrap();

        assert_eq!(resolved.arguments["gage"], "0123");
    }
}
