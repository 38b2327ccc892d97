// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Deployment configuration
//!
//! Maps component references to the container that executes them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::{DagcError, DagcResult};

/// Per-component executor specifications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub executors: BTreeMap<String, ExecutorSpec>,
}

impl DeploymentConfig {
    /// Load a deployment config from a YAML or JSON file
    pub fn from_file(path: &Path) -> DagcResult<Self> {
        let content = DagcError::read_file(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse a deployment config from a YAML string
    pub fn from_yaml(yaml: &str) -> DagcResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse a deployment config from a JSON string
    pub fn from_json(json: &str) -> DagcResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Register an executor for a component
    pub fn with_executor(mut self, component: impl Into<String>, spec: ExecutorSpec) -> Self {
        self.executors.insert(component.into(), spec);
        self
    }

    /// Executor for a component
    pub fn executor(&self, component: &str) -> Option<&ExecutorSpec> {
        self.executors.get(component)
    }
}

/// Container executing a component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorSpec {
    pub image: String,

    #[serde(default)]
    pub command: Vec<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub resources: Resources,
}

impl ExecutorSpec {
    /// Executor running `image` with `command`
    pub fn new(image: impl Into<String>, command: &[&str]) -> Self {
        Self {
            image: image.into(),
            command: command.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Container resource requests and limits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
}
