// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Workflow assembly
//!
//! Wraps the compiled root DAG in a run: run metadata, the root task
//! specification parameter and the root driver that every other task
//! descends from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::context::ContextPropagator;
use super::dag::{DagCompiler, DriverType, ScopeContext};
use super::document;
use super::naming::{self, Role, MAX_NAME_LEN};
use super::templates::{driver_params, param_ref, TemplateRegistry};
use crate::errors::{CompileError, CompileResult};
use crate::pipeline::{DeploymentConfig, PipelineSpec, ScopePath};
use crate::workflow::{
    Param, ParamSpec, PipelineBody, RunMetadata, RunSpec, WorkflowRun, WorkflowTask,
};

/// Run parameter carrying the serialized root task specification
pub const ROOT_TASK_SPEC_PARAM: &str = "task-spec";

/// Annotation holding the digest of the compiler inputs
pub const SOURCE_DIGEST_ANNOTATION: &str = "dagc.io/source-digest";

/// Target engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `apiVersion` of the emitted run
    pub api_version: String,

    /// `kind` of the emitted run
    pub kind: String,

    /// Name of the root driver task
    pub root_driver_task: String,

    /// Prefix of the root execution context
    pub root_execution_prefix: String,

    /// Engine expression that resolves to the run instance name
    pub run_name_placeholder: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_version: "tekton.dev/v1beta1".into(),
            kind: "PipelineRun".into(),
            root_driver_task: "root-driver".into(),
            root_execution_prefix: "kfp-root".into(),
            run_name_placeholder: "$(context.pipelineRun.name)".into(),
        }
    }
}

impl EngineConfig {
    /// Check that no setting is empty and that the root driver name can
    /// never be generated for a pipeline task
    pub fn validate(&self) -> CompileResult<()> {
        let settings = [
            ("api_version", &self.api_version),
            ("kind", &self.kind),
            ("root_driver_task", &self.root_driver_task),
            ("root_execution_prefix", &self.root_execution_prefix),
            ("run_name_placeholder", &self.run_name_placeholder),
        ];

        if let Some((key, _)) = settings.iter().find(|(_, value)| value.is_empty()) {
            return Err(CompileError::InvalidEngineConfig {
                reason: format!("{} is empty", key),
            });
        }

        let root = &self.root_driver_task;
        if naming::sanitize(root) != *root || root.len() > MAX_NAME_LEN {
            return Err(CompileError::InvalidEngineConfig {
                reason: format!("root_driver_task '{}' is not a valid task name", root),
            });
        }

        let reserved = [Role::Driver, Role::DagDriver, Role::Executor, Role::Publisher];
        if let Some(role) = reserved
            .iter()
            .find(|role| root.starts_with(&format!("{}-", role.prefix())))
        {
            return Err(CompileError::InvalidEngineConfig {
                reason: format!(
                    "root_driver_task '{}' starts with '{}-', which is reserved for pipeline tasks",
                    root,
                    role.prefix()
                ),
            });
        }

        Ok(())
    }

    /// Context of the root scope
    pub fn root_context(&self) -> String {
        ContextPropagator::root_context(&self.root_execution_prefix, &self.run_name_placeholder)
    }
}

/// Builds a complete run from a pipeline
pub struct WorkflowAssembler<'a> {
    engine: &'a EngineConfig,
    registry: &'a TemplateRegistry,
}

impl<'a> WorkflowAssembler<'a> {
    pub fn new(engine: &'a EngineConfig, registry: &'a TemplateRegistry) -> Self {
        Self { engine, registry }
    }

    /// Assemble the run for `pipeline`
    pub fn assemble(
        &self,
        pipeline: &PipelineSpec,
        deployment: &DeploymentConfig,
    ) -> CompileResult<WorkflowRun> {
        if pipeline.name.is_empty() {
            return Err(CompileError::EmptyPipelineName);
        }
        self.engine.validate()?;

        let root_scope = ScopeContext {
            path: ScopePath::root(),
            driver_task: self.engine.root_driver_task.clone(),
            context_name: self.engine.root_context(),
        };

        let mut compiler = DagCompiler::new(self.registry, deployment);
        compiler.reserve(&root_scope.driver_task, "root (dag-driver)")?;
        compiler.compile_scope(&pipeline.tasks, &root_scope)?;

        let mut tasks = vec![self.root_driver(&root_scope)];
        tasks.extend(compiler.finish());

        let annotations = BTreeMap::from([(
            SOURCE_DIGEST_ANNOTATION.to_string(),
            source_digest(pipeline, deployment)?,
        )]);

        Ok(WorkflowRun {
            api_version: self.engine.api_version.clone(),
            kind: self.engine.kind.clone(),
            metadata: RunMetadata {
                generate_name: format!("{}-", pipeline.name),
                annotations,
            },
            spec: RunSpec {
                params: vec![Param::string(
                    ROOT_TASK_SPEC_PARAM,
                    document::root_task_spec(pipeline)?,
                )],
                pipeline_spec: PipelineBody {
                    params: vec![ParamSpec {
                        name: ROOT_TASK_SPEC_PARAM.into(),
                        param_type: "string".into(),
                        description: Some("Specification of the root DAG".into()),
                    }],
                    tasks,
                },
            },
        })
    }

    fn root_driver(&self, root: &ScopeContext) -> WorkflowTask {
        WorkflowTask::new(
            root.driver_task.clone(),
            self.registry.template_for(Role::DagDriver),
        )
        .with_param(Param::string(
            driver_params::EXECUTION_NAME,
            root.context_name.clone(),
        ))
        .with_param(Param::string(driver_params::PARENT_CONTEXT_NAME, ""))
        .with_param(Param::string(
            driver_params::DRIVER_TYPE,
            DriverType::Dag.as_str(),
        ))
        .with_param(Param::string(
            driver_params::TASK_SPEC,
            param_ref(ROOT_TASK_SPEC_PARAM),
        ))
    }
}

/// BLAKE3 digest of the compiler inputs
pub fn source_digest(
    pipeline: &PipelineSpec,
    deployment: &DeploymentConfig,
) -> CompileResult<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&serde_json::to_vec(pipeline)?);
    hasher.update(&serde_json::to_vec(deployment)?);
    Ok(hasher.finalize().to_hex().to_string())
}
