// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! # dagc - ML pipeline DAG compiler
//!
//! `dagc` compiles a pipeline DAG and its deployment config into a Tekton
//! `PipelineRun` that a Kubernetes workflow engine executes.
//!
//! ## Features
//!
//! - **Driver, executor, publisher chains** - every container task is split
//!   into input resolution, execution and output recording
//! - **Nested DAGs** - composite tasks compile into their own scopes
//! - **Static checks** - cycles, dangling output references and missing
//!   executors are rejected before anything is emitted
//! - **Deterministic output** - identical inputs give byte-identical runs
//!
//! ## Quick Start
//!
//! ```bash
//! # Check a pipeline against its deployment config
//! dagc validate pipeline.yaml -d deployment.yaml
//!
//! # Compile it to a PipelineRun
//! dagc compile pipeline.yaml -d deployment.yaml -o run.yaml
//!
//! # Render the compiled task graph
//! dagc graph pipeline.yaml --compiled -d deployment.yaml -f mermaid
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod workflow;

// Re-export commonly used types
pub use compiler::{compile, Compiler, EngineConfig, TemplateRegistry};
pub use config::DagcConfig;
pub use errors::{CompileError, CompileResult, DagcError, DagcResult};
pub use pipeline::{DeploymentConfig, ExecutorSpec, PipelineSpec, TaskSpec, ValueSource};
pub use workflow::{RunGraph, WorkflowRun, WorkflowTask};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
