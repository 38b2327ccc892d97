// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Execution-context naming
//!
//! Every task executes inside a context derived from its scope's context
//! and its own name. The root scope has no parent context.

use crate::pipeline::CONTEXT_SEPARATOR;

/// Derives execution-context identifiers
pub struct ContextPropagator;

impl ContextPropagator {
    /// Context of `task` inside `parent`
    ///
    /// An empty `parent` stands for the root, which has no parent context.
    /// Task names never contain the separator, so distinct siblings always
    /// get distinct contexts.
    pub fn child_context(parent: &str, task: &str) -> String {
        if parent.is_empty() {
            task.to_string()
        } else {
            format!("{}{}{}", parent, CONTEXT_SEPARATOR, task)
        }
    }

    /// Context of the root scope for a run
    ///
    /// `run_name` is usually an engine placeholder that resolves to the run
    /// instance name, so each run gets its own root context.
    pub fn root_context(prefix: &str, run_name: &str) -> String {
        Self::child_context("", &format!("{}-{}", prefix, run_name))
    }
}
