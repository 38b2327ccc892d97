// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Step template registry
//!
//! Compiled tasks reference reusable templates by name. The registry is a
//! plain value handed to the compiler, so several registries (for example
//! one per engine version) can be used side by side.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::naming::Role;
use crate::errors::{CompileError, CompileResult};

/// Parameter names of the driver template
pub mod driver_params {
    pub const EXECUTION_NAME: &str = "execution-name";
    pub const PARENT_CONTEXT_NAME: &str = "parent-context-name";
    pub const DRIVER_TYPE: &str = "driver-type";
    pub const TASK_SPEC: &str = "task-spec";
    pub const UPSTREAM_CONTEXTS: &str = "upstream-contexts";
}

/// Parameter names of the executor template
pub mod executor_params {
    pub const IMAGE: &str = "image";
    pub const COMMAND: &str = "command";
    pub const ARGS: &str = "args";
    pub const ENV: &str = "env";
    pub const RESOURCES: &str = "resources";
    pub const EXECUTION_ID: &str = "execution-id";
    pub const EXECUTOR_INPUT: &str = "executor-input";
}

/// Parameter names of the publisher template
pub mod publisher_params {
    pub const PUBLISHER_TYPE: &str = "publisher-type";
    pub const EXECUTION_ID: &str = "execution-id";
    pub const EXECUTOR_OUTPUT: &str = "executor-output";
    pub const CONTEXT_NAME: &str = "context-name";
}

/// Result names the templates emit
pub mod results {
    pub const CONTEXT_NAME: &str = "context-name";
    pub const EXECUTION_ID: &str = "execution-id";
    pub const EXECUTOR_INPUT: &str = "executor-input";
    pub const EXECUTOR_OUTPUT: &str = "executor-output";
}

/// Reference to result `result` of compiled task `task`
pub fn result_ref(task: &str, result: &str) -> String {
    format!("$(tasks.{}.results.{})", task, result)
}

/// Reference to run parameter `name`
pub fn param_ref(name: &str) -> String {
    format!("$(params.{})", name)
}

/// Named step templates the compiler binds tasks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRegistry {
    /// Driver of container-backed tasks
    pub driver: String,

    /// Driver of DAG-backed tasks and of the root
    pub dag_driver: String,

    /// Default executor binding
    pub executor: String,

    /// Publisher of container-backed tasks
    pub publisher: String,

    /// Executor bindings overriding `executor` per component
    pub bindings: BTreeMap<String, String>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self {
            driver: "kfp-executor-driver".into(),
            dag_driver: "kfp-dag-driver".into(),
            executor: "kfp-executor".into(),
            publisher: "kfp-executor-publisher".into(),
            bindings: BTreeMap::new(),
        }
    }
}

impl TemplateRegistry {
    /// Build a registry, checking that every template name is usable
    pub fn new(
        driver: impl Into<String>,
        dag_driver: impl Into<String>,
        executor: impl Into<String>,
        publisher: impl Into<String>,
    ) -> CompileResult<Self> {
        let registry = Self {
            driver: driver.into(),
            dag_driver: dag_driver.into(),
            executor: executor.into(),
            publisher: publisher.into(),
            bindings: BTreeMap::new(),
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Bind a component to its own executor template
    pub fn with_binding(
        mut self,
        component: impl Into<String>,
        template: impl Into<String>,
    ) -> CompileResult<Self> {
        let template = template.into();
        if template.is_empty() {
            return Err(CompileError::InvalidTemplateRegistry {
                reason: "executor binding has an empty template name".into(),
            });
        }
        self.bindings.insert(component.into(), template);
        Ok(self)
    }

    /// Check that role templates are named and distinct
    pub fn validate(&self) -> CompileResult<()> {
        let roles = [
            ("driver", &self.driver),
            ("dag_driver", &self.dag_driver),
            ("executor", &self.executor),
            ("publisher", &self.publisher),
        ];

        let mut seen = BTreeSet::new();
        for (role, name) in roles {
            if name.is_empty() {
                return Err(CompileError::InvalidTemplateRegistry {
                    reason: format!("{} template name is empty", role),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(CompileError::InvalidTemplateRegistry {
                    reason: format!("template '{}' is used for more than one role", name),
                });
            }
        }

        if let Some((component, _)) = self.bindings.iter().find(|(_, t)| t.is_empty()) {
            return Err(CompileError::InvalidTemplateRegistry {
                reason: format!("executor binding for '{}' is empty", component),
            });
        }

        Ok(())
    }

    /// Template for a role; executors use the default binding
    pub fn template_for(&self, role: Role) -> &str {
        match role {
            Role::Driver => &self.driver,
            Role::DagDriver => &self.dag_driver,
            Role::Executor => &self.executor,
            Role::Publisher => &self.publisher,
        }
    }

    /// Executor template bound to a component
    pub fn executor_for(&self, component: &str) -> &str {
        self.bindings
            .get(component)
            .map(String::as_str)
            .unwrap_or(&self.executor)
    }
}
