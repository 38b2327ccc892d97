// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Pipeline definitions and types
//!
//! This module defines the input side of the compiler: pipeline DAGs,
//! deployment configs, scope paths, and the static checks run on them.

mod dag;
mod definition;
mod deployment;
mod scope;
mod validation;

pub use dag::DagBuilder;
pub use definition::*;
pub use deployment::{DeploymentConfig, ExecutorSpec, Resources};
pub use scope::{ScopePath, ROOT_SCOPE};
pub use validation::{PipelineValidator, ValidationReport, CONTEXT_SEPARATOR};
pub(crate) use validation::{check_task_output, resolve_reference, ScopeFrame};
