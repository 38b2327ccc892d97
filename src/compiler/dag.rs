// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! DAG compiler
//!
//! Expands every logical task of a scope into its execution-time chain and
//! wires the chains by the scope's dependencies:
//!
//! - container task: `driver → executor → publisher`
//! - DAG task: `dag-driver`, followed by the compiled nested scope
//!
//! A task with no dependencies runs after its scope's driver. Dependents of
//! a DAG task run after the exit tasks of its nested scope, the same way
//! dependents of a container task run after its publisher.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::context::ContextPropagator;
use super::document;
use super::naming::{task_name, NameArena, Role};
use super::templates::{
    driver_params, executor_params, publisher_params, result_ref, results, TemplateRegistry,
};
use crate::errors::{CompileError, CompileResult};
use crate::pipeline::{
    check_task_output, resolve_reference, DagSpec, DeploymentConfig, ExecutorSpec, ScopeFrame,
    ScopePath, TaskSpec, ValueSource,
};
use crate::workflow::{Param, WorkflowTask};

/// How a task executes
#[derive(Debug, Clone, Copy)]
pub enum TaskKind<'a> {
    /// Runs a container
    Container(&'a ExecutorSpec),
    /// Expands into a nested DAG
    Dag(&'a DagSpec),
}

impl<'a> TaskKind<'a> {
    /// Decide the kind of `task`; leaf tasks need an executor
    pub fn of(
        task: &'a TaskSpec,
        deployment: &'a DeploymentConfig,
        scope: &ScopePath,
    ) -> CompileResult<Self> {
        if let Some(dag) = &task.dag {
            return Ok(Self::Dag(dag));
        }

        deployment
            .executor(&task.component_ref)
            .map(Self::Container)
            .ok_or_else(|| CompileError::MissingExecutorSpec {
                task: scope.qualify(&task.name),
                component: task.component_ref.clone(),
            })
    }

    pub fn driver_type(&self) -> DriverType {
        match self {
            Self::Container(_) => DriverType::Container,
            Self::Dag(_) => DriverType::Dag,
        }
    }
}

/// Kind of driver, as passed to the driver template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverType {
    Container,
    Dag,
}

impl DriverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "CONTAINER",
            Self::Dag => "DAG",
        }
    }
}

/// Context of the scope being compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    pub path: ScopePath,
    /// Compiled task that establishes this scope's context
    pub driver_task: String,
    /// Execution context of the scope
    pub context_name: String,
}

impl ScopeContext {
    /// Context of the DAG nested under `task`, driven by `dag_driver`
    fn nested(&self, task: &str, dag_driver: String) -> Self {
        Self {
            path: self.path.child(task),
            driver_task: dag_driver,
            context_name: ContextPropagator::child_context(&self.context_name, task),
        }
    }
}

/// Recursive DAG compiler with an accumulator of emitted tasks
pub struct DagCompiler<'a> {
    registry: &'a TemplateRegistry,
    deployment: &'a DeploymentConfig,
    names: NameArena,
    frames: Vec<ScopeFrame<'a>>,
    tasks: Vec<WorkflowTask>,
}

impl<'a> DagCompiler<'a> {
    pub fn new(registry: &'a TemplateRegistry, deployment: &'a DeploymentConfig) -> Self {
        Self {
            registry,
            deployment,
            names: NameArena::new(),
            frames: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Reserve a name emitted outside the compiler, such as the root driver
    pub fn reserve(&mut self, name: &str, owner: &str) -> CompileResult<()> {
        self.names.claim(name, owner.to_string())
    }

    /// Compile one scope, recursing into nested DAGs
    pub fn compile_scope(&mut self, tasks: &'a [TaskSpec], scope: &ScopeContext) -> CompileResult<()> {
        tracing::debug!(scope = %scope.path, tasks = tasks.len(), "compiling scope");

        self.frames.push(ScopeFrame::build(tasks, scope.path.clone())?);

        for task in tasks {
            // Warnings are reported by the validator
            for (input, source) in &task.inputs {
                if let ValueSource::TaskOutput {
                    task: reference,
                    param,
                } = source
                {
                    check_task_output(&self.frames, task, input, reference, param)?;
                }
            }

            let kind = TaskKind::of(task, self.deployment, &scope.path)?;
            let driver_role = match kind {
                TaskKind::Container(_) => Role::Driver,
                TaskKind::Dag(_) => Role::DagDriver,
            };

            let driver = self.driver_task(task, tasks, scope, kind, driver_role)?;
            let driver_name = driver.name.clone();
            self.emit(driver, scope, task, driver_role)?;

            match kind {
                TaskKind::Container(executor_spec) => {
                    let executor = self.executor_task(task, executor_spec, scope, &driver_name)?;
                    let executor_name = executor.name.clone();
                    self.emit(executor, scope, task, Role::Executor)?;

                    let publisher = self.publisher_task(task, scope, &driver_name, &executor_name);
                    self.emit(publisher, scope, task, Role::Publisher)?;
                }
                TaskKind::Dag(dag) => {
                    let nested = scope.nested(&task.name, driver_name);
                    self.compile_scope(&dag.tasks, &nested)?;
                }
            }
        }

        self.frames.pop();
        Ok(())
    }

    /// Emitted tasks in emission order
    pub fn finish(self) -> Vec<WorkflowTask> {
        self.tasks
    }

    fn emit(
        &mut self,
        workflow_task: WorkflowTask,
        scope: &ScopeContext,
        task: &TaskSpec,
        role: Role,
    ) -> CompileResult<()> {
        let owner = format!("{} ({})", scope.path.qualify(&task.name), role);
        self.names.claim(&workflow_task.name, owner)?;
        self.tasks.push(workflow_task);
        Ok(())
    }

    fn driver_task(
        &self,
        task: &TaskSpec,
        siblings: &[TaskSpec],
        scope: &ScopeContext,
        kind: TaskKind<'_>,
        role: Role,
    ) -> CompileResult<WorkflowTask> {
        let run_after = if task.dependencies.is_empty() {
            BTreeSet::from([scope.driver_task.clone()])
        } else {
            task.dependencies
                .iter()
                .filter_map(|dep| siblings.iter().find(|s| &s.name == dep))
                .flat_map(|dep| exit_tasks(&scope.path, dep))
                .collect()
        };

        let execution_name = ContextPropagator::child_context(&scope.context_name, &task.name);
        let upstream = self.upstream_contexts(task, scope)?;

        Ok(
            WorkflowTask::new(
                task_name(&scope.path, &task.name, role),
                self.registry.template_for(role),
            )
            .run_after(run_after)
            .with_param(Param::string(driver_params::EXECUTION_NAME, execution_name))
            .with_param(Param::string(
                driver_params::PARENT_CONTEXT_NAME,
                result_ref(&scope.driver_task, results::CONTEXT_NAME),
            ))
            .with_param(Param::string(
                driver_params::DRIVER_TYPE,
                kind.driver_type().as_str(),
            ))
            .with_param(Param::string(
                driver_params::TASK_SPEC,
                document::task_spec(task)?,
            ))
            .with_param(Param::string(driver_params::UPSTREAM_CONTEXTS, upstream)),
        )
    }

    fn executor_task(
        &self,
        task: &TaskSpec,
        spec: &ExecutorSpec,
        scope: &ScopeContext,
        driver: &str,
    ) -> CompileResult<WorkflowTask> {
        Ok(WorkflowTask::new(
            task_name(&scope.path, &task.name, Role::Executor),
            self.registry.executor_for(&task.component_ref),
        )
        .run_after([driver.to_string()])
        .with_param(Param::string(executor_params::IMAGE, spec.image.clone()))
        .with_param(Param::array(executor_params::COMMAND, spec.command.clone()))
        .with_param(Param::array(executor_params::ARGS, spec.args.clone()))
        .with_param(Param::string(executor_params::ENV, string_map_json(&spec.env)))
        .with_param(Param::string(
            executor_params::RESOURCES,
            serde_json::to_string(&spec.resources)?,
        ))
        .with_param(Param::string(
            executor_params::EXECUTION_ID,
            result_ref(driver, results::EXECUTION_ID),
        ))
        .with_param(Param::string(
            executor_params::EXECUTOR_INPUT,
            result_ref(driver, results::EXECUTOR_INPUT),
        )))
    }

    fn publisher_task(
        &self,
        task: &TaskSpec,
        scope: &ScopeContext,
        driver: &str,
        executor: &str,
    ) -> WorkflowTask {
        WorkflowTask::new(
            task_name(&scope.path, &task.name, Role::Publisher),
            self.registry.template_for(Role::Publisher),
        )
        .run_after([executor.to_string()])
        .with_param(Param::string(publisher_params::PUBLISHER_TYPE, "EXECUTOR"))
        .with_param(Param::string(
            publisher_params::EXECUTION_ID,
            result_ref(driver, results::EXECUTION_ID),
        ))
        .with_param(Param::string(
            publisher_params::EXECUTOR_OUTPUT,
            result_ref(executor, results::EXECUTOR_OUTPUT),
        ))
        .with_param(Param::string(
            publisher_params::CONTEXT_NAME,
            ContextPropagator::child_context(&scope.context_name, &task.name),
        ))
    }

    /// Published context of every dependency and every task whose outputs are read
    fn upstream_contexts(&self, task: &TaskSpec, scope: &ScopeContext) -> CompileResult<String> {
        let mut upstream = BTreeMap::new();

        if let Some(frame) = self.frames.last() {
            for dep in &task.dependencies {
                if let Some(sibling) = frame.tasks.iter().find(|s| &s.name == dep) {
                    upstream.insert(dep.clone(), published_context(&scope.path, sibling));
                }
            }
        }

        for (input, source) in &task.inputs {
            let ValueSource::TaskOutput {
                task: reference,
                param,
            } = source
            else {
                continue;
            };
            if upstream.contains_key(reference) {
                continue;
            }

            let (depth, referenced) = resolve_reference(&self.frames, reference).ok_or_else(|| {
                CompileError::DanglingTaskOutputReference {
                    task: scope.path.qualify(&task.name),
                    input: input.clone(),
                    reference: reference.clone(),
                    param: param.clone(),
                }
            })?;

            upstream.insert(
                reference.clone(),
                published_context(&self.frames[depth].path, referenced),
            );
        }

        Ok(string_map_json(&upstream))
    }
}

/// Compile one scope on its own
///
/// `parent` names the scope's driver and context. The returned tasks do not
/// include that driver.
pub fn compile_dag(
    tasks: &[TaskSpec],
    parent: &ScopeContext,
    registry: &TemplateRegistry,
    deployment: &DeploymentConfig,
) -> CompileResult<Vec<WorkflowTask>> {
    let mut compiler = DagCompiler::new(registry, deployment);
    compiler.reserve(&parent.driver_task, &format!("{} (scope driver)", parent.path))?;
    compiler.compile_scope(tasks, parent)?;
    Ok(compiler.finish())
}

/// Compiled tasks that dependents of `task` run after
///
/// A container task exits through its publisher. A DAG task exits through
/// the exit tasks of its nested sinks, or its dag-driver when the nested DAG
/// is empty.
pub fn exit_tasks(scope: &ScopePath, task: &TaskSpec) -> BTreeSet<String> {
    let Some(dag) = &task.dag else {
        return BTreeSet::from([task_name(scope, &task.name, Role::Publisher)]);
    };

    let nested = scope.child(&task.name);
    let exits: BTreeSet<String> = sinks(&dag.tasks)
        .flat_map(|sink| exit_tasks(&nested, sink))
        .collect();

    if exits.is_empty() {
        BTreeSet::from([task_name(scope, &task.name, Role::DagDriver)])
    } else {
        exits
    }
}

/// Tasks no sibling depends on
fn sinks(tasks: &[TaskSpec]) -> impl Iterator<Item = &TaskSpec> {
    let depended_on: HashSet<&str> = tasks
        .iter()
        .flat_map(|t| t.dependencies.iter().map(String::as_str))
        .collect();

    tasks
        .iter()
        .filter(move |t| !depended_on.contains(t.name.as_str()))
}

/// Reference to the context a task publishes for its dependents
pub fn published_context(scope: &ScopePath, task: &TaskSpec) -> String {
    let role = match task.dag {
        Some(_) => Role::DagDriver,
        None => Role::Publisher,
    };
    result_ref(&task_name(scope, &task.name, role), results::CONTEXT_NAME)
}

fn string_map_json(map: &BTreeMap<String, String>) -> String {
    let object: Map<String, Value> = map
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(object).to_string()
}
