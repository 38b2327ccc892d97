// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Static compilation errors
//!
//! Every variant is detected before any output exists. Task-level variants
//! carry the fully-qualified scope path of the offending task.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for the pure compile pass
pub type CompileResult<T> = Result<T, CompileError>;

/// Error raised while validating or compiling a pipeline
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum CompileError {
    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline name is empty")]
    #[diagnostic(
        code(dagc::empty_pipeline_name),
        help("Set a non-empty `name` at the top of the pipeline definition")
    )]
    EmptyPipelineName,

    #[error("Task name '{task}' is invalid: {reason}")]
    #[diagnostic(code(dagc::invalid_task_name))]
    InvalidTaskName { task: String, reason: String },

    #[error("Duplicate task name '{task}' in scope '{scope}'")]
    #[diagnostic(
        code(dagc::duplicate_task_name),
        help("Task names must be unique among siblings of the same DAG")
    )]
    DuplicateTaskName { scope: String, task: String },

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    #[diagnostic(
        code(dagc::unknown_dependency),
        help("Dependencies must name a sibling task in the same DAG")
    )]
    UnknownDependency { task: String, dependency: String },

    #[error("Cyclic dependency in scope '{scope}': {}", .tasks.join(" → "))]
    #[diagnostic(
        code(dagc::cyclic_dependency),
        help("Review the task dependencies to remove the cycle")
    )]
    CyclicDependency { scope: String, tasks: Vec<String> },

    #[error(
        "Task '{task}' input '{input}' references output '{param}' of '{reference}', \
         which is not declared in scope"
    )]
    #[diagnostic(
        code(dagc::dangling_task_output),
        help("The referenced task must exist in the same or an enclosing DAG and list '{param}' in its outputs")
    )]
    DanglingTaskOutputReference {
        task: String,
        input: String,
        reference: String,
        param: String,
    },

    #[error("Task '{task}' uses component '{component}' which has no executor in the deployment config")]
    #[diagnostic(
        code(dagc::missing_executor_spec),
        help("Add an entry for '{component}' under `executors` in the deployment config")
    )]
    MissingExecutorSpec { task: String, component: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Emission Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Generated task name '{name}' is used by both '{first}' and '{second}'")]
    #[diagnostic(
        code(dagc::task_name_collision),
        help("Rename one of the tasks; names are lowercased and non-alphanumerics become '-'")
    )]
    TaskNameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid template registry: {reason}")]
    #[diagnostic(code(dagc::invalid_template_registry))]
    InvalidTemplateRegistry { reason: String },

    #[error("Invalid engine settings: {reason}")]
    #[diagnostic(code(dagc::invalid_engine_config))]
    InvalidEngineConfig { reason: String },

    #[error("Failed to serialize task specification: {message}")]
    #[diagnostic(code(dagc::serialization))]
    Serialization { message: String },
}

impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization { message: e.to_string() }
    }
}

impl CompileError {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyPipelineName => "EmptyPipelineName",
            Self::InvalidTaskName { .. } => "InvalidTaskName",
            Self::DuplicateTaskName { .. } => "DuplicateTaskName",
            Self::UnknownDependency { .. } => "UnknownDependency",
            Self::CyclicDependency { .. } => "CyclicDependency",
            Self::DanglingTaskOutputReference { .. } => "DanglingTaskOutputReference",
            Self::MissingExecutorSpec { .. } => "MissingExecutorSpec",
            Self::TaskNameCollision { .. } => "TaskNameCollision",
            Self::InvalidTemplateRegistry { .. } => "InvalidTemplateRegistry",
            Self::InvalidEngineConfig { .. } => "InvalidEngineConfig",
            Self::Serialization { .. } => "Serialization",
        }
    }
}
