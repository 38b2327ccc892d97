// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Compiled workflow run
//!
//! Output types shaped after the Tekton `PipelineRun` schema. Tasks declare
//! their ordering with `runAfter` and reference templates with `taskRef`.

mod graph;

pub use graph::RunGraph;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::DagcResult;

/// A compiled run, ready for the workflow engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub api_version: String,
    pub kind: String,
    pub metadata: RunMetadata,
    pub spec: RunSpec,
}

/// Object metadata of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub generate_name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Run spec: run parameters plus the embedded pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSpec {
    #[serde(default)]
    pub params: Vec<Param>,
    pub pipeline_spec: PipelineBody,
}

/// Embedded pipeline: declared parameters and the flattened task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineBody {
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    pub tasks: Vec<WorkflowTask>,
}

/// Declaration of a pipeline parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
}

impl Param {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::String(value.into()),
        }
    }

    pub fn array(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::Array(values),
        }
    }
}

/// Parameter value: a string or an array of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Array(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Array(_) => None,
        }
    }

    /// All strings carried by the value
    pub fn strings(&self) -> Vec<&str> {
        match self {
            Self::String(s) => vec![s.as_str()],
            Self::Array(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Reference to a reusable step template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub name: String,
}

/// One compiled task of the flattened run DAG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTask {
    pub name: String,
    pub task_ref: TaskRef,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub run_after: BTreeSet<String>,

    #[serde(default)]
    pub params: Vec<Param>,
}

impl WorkflowTask {
    /// Task `name` bound to template `template`
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_ref: TaskRef {
                name: template.into(),
            },
            run_after: BTreeSet::new(),
            params: Vec::new(),
        }
    }

    pub fn run_after(mut self, tasks: impl IntoIterator<Item = String>) -> Self {
        self.run_after.extend(tasks);
        self
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Template this task invokes
    pub fn template(&self) -> &str {
        &self.task_ref.name
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ParamValue::as_str)
    }
}

impl WorkflowRun {
    /// `generateName` of the run
    pub fn generate_name(&self) -> &str {
        &self.metadata.generate_name
    }

    /// Top-level run parameters
    pub fn params(&self) -> &[Param] {
        &self.spec.params
    }

    /// Flattened task list, root driver first
    pub fn root_dag(&self) -> &[WorkflowTask] {
        &self.spec.pipeline_spec.tasks
    }

    /// Look up a compiled task by name
    pub fn task(&self, name: &str) -> Option<&WorkflowTask> {
        self.root_dag().iter().find(|t| t.name == name)
    }

    /// Serialize the run to YAML
    pub fn to_yaml(&self) -> DagcResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Serialize the run to pretty-printed JSON
    pub fn to_json(&self) -> DagcResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// BLAKE3 digest of the run's canonical JSON form
    ///
    /// Two compilations of the same inputs have the same digest.
    pub fn digest(&self) -> DagcResult<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run() -> WorkflowRun {
        WorkflowRun {
            api_version: "tekton.dev/v1beta1".into(),
            kind: "PipelineRun".into(),
            metadata: RunMetadata {
                generate_name: "sample-".into(),
                annotations: BTreeMap::new(),
            },
            spec: RunSpec {
                params: vec![Param::string("task-spec", "{}")],
                pipeline_spec: PipelineBody {
                    params: vec![],
                    tasks: vec![
                        WorkflowTask::new("root", "kfp-dag-driver"),
                        WorkflowTask::new("exec", "kfp-executor")
                            .run_after(["root".to_string()])
                            .with_param(Param::array("command", vec!["echo".into(), "hi".into()])),
                    ],
                },
            },
        }
    }

    #[test]
    fn test_serialized_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_run().to_json().unwrap()).unwrap();

        assert_eq!(json["apiVersion"], "tekton.dev/v1beta1");
        assert_eq!(json["metadata"]["generateName"], "sample-");
        assert!(json["metadata"].get("annotations").is_none());
        assert_eq!(json["spec"]["params"][0]["name"], "task-spec");

        let tasks = &json["spec"]["pipelineSpec"]["tasks"];
        assert!(tasks[0].get("runAfter").is_none());
        assert_eq!(tasks[1]["taskRef"]["name"], "kfp-executor");
        assert_eq!(tasks[1]["runAfter"][0], "root");
        assert_eq!(tasks[1]["params"][0]["value"][1], "hi");
    }

    #[test]
    fn test_yaml_round_trip_keeps_param_shapes() {
        let run = sample_run();

        let parsed: WorkflowRun = serde_yaml::from_str(&run.to_yaml().unwrap()).unwrap();

        assert_eq!(parsed, run);
        assert_eq!(
            parsed.task("exec").unwrap().param("command").unwrap().strings(),
            vec!["echo", "hi"]
        );
    }

    #[test]
    fn test_digest_tracks_content() {
        let run = sample_run();
        let mut changed = sample_run();
        changed.metadata.generate_name = "other-".into();

        assert_eq!(run.digest().unwrap(), sample_run().digest().unwrap());
        assert_ne!(run.digest().unwrap(), changed.digest().unwrap());
    }
}
