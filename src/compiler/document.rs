// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Task specification documents
//!
//! Drivers receive the unresolved specification of their task as a JSON
//! string. Value sources are passed through as written; the driver resolves
//! them at run time.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::CompileResult;
use crate::pipeline::{ParameterSpec, PipelineSpec, TaskSpec, ValueSource};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskSpecDocument<'a, P: Serialize> {
    task_info: TaskInfo<'a>,

    #[serde(skip_serializing_if = "Option::is_none")]
    component_ref: Option<&'a str>,

    inputs: Inputs<'a, P>,

    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<&'a BTreeSet<String>>,
}

#[derive(Debug, Serialize)]
struct TaskInfo<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Inputs<'a, P: Serialize> {
    parameters: &'a BTreeMap<String, P>,
}

/// Unresolved specification of one task, as handed to its driver
pub fn task_spec(task: &TaskSpec) -> CompileResult<String> {
    let document: TaskSpecDocument<'_, ValueSource> = TaskSpecDocument {
        task_info: TaskInfo { name: &task.name },
        component_ref: Some(&task.component_ref).filter(|c| !c.is_empty()).map(String::as_str),
        inputs: Inputs {
            parameters: &task.inputs,
        },
        outputs: Some(&task.outputs).filter(|o| !o.is_empty()),
    };

    Ok(serde_json::to_string(&document)?)
}

/// Specification of the root DAG: the pipeline name and its declared parameters
pub fn root_task_spec(pipeline: &PipelineSpec) -> CompileResult<String> {
    let document: TaskSpecDocument<'_, ParameterSpec> = TaskSpecDocument {
        task_info: TaskInfo {
            name: &pipeline.name,
        },
        component_ref: None,
        inputs: Inputs {
            parameters: &pipeline.parameters,
        },
        outputs: None,
    };

    Ok(serde_json::to_string(&document)?)
}
