// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Pipeline definition structures
//!
//! Defines the schema of pipeline documents: a named DAG of tasks, each
//! either backed by a component (container) or by a nested DAG.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::errors::{DagcError, DagcResult};

/// Pipeline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    /// Pipeline name, used as the run's `generateName` prefix
    #[serde(default)]
    pub name: String,

    /// Pipeline description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared run parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParameterSpec>,

    /// Root scope tasks
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl PipelineSpec {
    /// Load a pipeline from a YAML or JSON file
    pub fn from_file(path: &Path) -> DagcResult<Self> {
        let content = DagcError::read_file(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse a pipeline from a YAML string
    pub fn from_yaml(yaml: &str) -> DagcResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse a pipeline from a JSON string
    pub fn from_json(json: &str) -> DagcResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Count leaf and composite tasks over all scopes
    pub fn task_counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        count_tasks(&self.tasks, &mut counts);
        counts
    }
}

fn count_tasks(tasks: &[TaskSpec], counts: &mut TaskCounts) {
    for task in tasks {
        match &task.dag {
            Some(dag) => {
                counts.composite += 1;
                count_tasks(&dag.tasks, counts);
            }
            None => counts.leaf += 1,
        }
    }
}

/// Number of leaf and composite tasks in a pipeline, nested scopes included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub leaf: usize,
    pub composite: usize,
}

impl TaskCounts {
    /// Number of workflow tasks a compiled run contains
    pub fn expected_workflow_tasks(&self) -> usize {
        3 * self.leaf + self.composite + 1
    }
}

/// A declared run parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    #[serde(default, rename = "type")]
    pub parameter_type: ParameterType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameter types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[default]
    String,
    Int,
    Double,
    Bool,
    Struct,
    List,
}

/// A single task of a DAG scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Task name (unique within its scope)
    pub name: String,

    /// Component implementing this task; looked up in the deployment config
    /// for leaf tasks
    #[serde(default)]
    pub component_ref: String,

    /// Sibling tasks that must complete first
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dependencies: BTreeSet<String>,

    /// Input parameters and where their values come from
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, ValueSource>,

    /// Declared output parameters
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub outputs: BTreeSet<String>,

    /// Nested DAG; present iff the task is composite
    #[serde(default, alias = "subDag", skip_serializing_if = "Option::is_none")]
    pub dag: Option<DagSpec>,
}

impl TaskSpec {
    /// Create a leaf task bound to a component
    pub fn leaf(name: impl Into<String>, component_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_ref: component_ref.into(),
            dependencies: BTreeSet::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeSet::new(),
            dag: None,
        }
    }

    /// Create a composite task wrapping a nested DAG
    pub fn composite(name: impl Into<String>, tasks: Vec<TaskSpec>) -> Self {
        let name = name.into();
        Self {
            component_ref: format!("comp-{}", name),
            name,
            dependencies: BTreeSet::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeSet::new(),
            dag: Some(DagSpec { tasks }),
        }
    }

    /// Add a dependency on a sibling task
    pub fn after(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.insert(dependency.into());
        self
    }

    /// Add an input
    pub fn with_input(mut self, name: impl Into<String>, source: ValueSource) -> Self {
        self.inputs.insert(name.into(), source);
        self
    }

    /// Declare an output parameter
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.insert(name.into());
        self
    }

    /// Whether the task wraps a nested DAG
    pub fn is_composite(&self) -> bool {
        self.dag.is_some()
    }
}

/// A nested DAG
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DagSpec {
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

/// Origin of a task input value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    /// Literal value
    Constant(serde_json::Value),

    /// Top-level run parameter
    RuntimeParameter(String),

    /// Output of another task in this or an enclosing scope
    TaskOutput { task: String, param: String },
}
