// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Pipeline validation
//!
//! Static checks run before any workflow task is emitted. Scopes are
//! visited depth-first in declaration order and the first error aborts.
//! Within a scope, names are checked before dependencies, and dependencies
//! (unknown names, cycles) before inputs and executors.

use std::collections::HashSet;

use crate::errors::{CompileError, CompileResult};
use crate::pipeline::{
    DagBuilder, DeploymentConfig, PipelineSpec, ScopePath, TaskCounts, TaskSpec, ValueSource,
};

/// Separator of execution-context identifiers; not allowed in task names
pub const CONTEXT_SEPARATOR: char = '/';

/// Pipeline validator
pub struct PipelineValidator;

/// One scope on a check stack
///
/// The compiler keeps the same stack while emitting, so both passes share
/// the scope and output-reference checks.
pub(crate) struct ScopeFrame<'a> {
    pub(crate) tasks: &'a [TaskSpec],
    pub(crate) path: ScopePath,
    pub(crate) dag: DagBuilder,
}

impl<'a> ScopeFrame<'a> {
    /// Check task names, duplicates and dependencies of one scope
    pub(crate) fn build(tasks: &'a [TaskSpec], path: ScopePath) -> CompileResult<Self> {
        let mut seen_names = HashSet::new();
        for task in tasks {
            check_name(task, &path)?;

            if !seen_names.insert(task.name.as_str()) {
                return Err(CompileError::DuplicateTaskName {
                    scope: path.to_string(),
                    task: task.name.clone(),
                });
            }
        }

        // Unknown dependencies and cycles
        let dag = DagBuilder::build(tasks, &path)?;

        Ok(Self { tasks, path, dag })
    }
}

impl PipelineValidator {
    /// Validate a pipeline against a deployment config
    pub fn validate(
        pipeline: &PipelineSpec,
        deployment: &DeploymentConfig,
    ) -> CompileResult<ValidationReport> {
        if pipeline.name.is_empty() {
            return Err(CompileError::EmptyPipelineName);
        }

        let mut report = ValidationReport {
            counts: pipeline.task_counts(),
            ..ValidationReport::default()
        };

        let mut stack = Vec::new();
        Self::validate_scope(
            pipeline,
            deployment,
            &pipeline.tasks,
            ScopePath::root(),
            &mut stack,
            &mut report,
        )?;

        for warning in &report.warnings {
            tracing::warn!(pipeline = %pipeline.name, "{}", warning);
        }

        Ok(report)
    }

    /// Validate one scope and, recursively, the scopes nested in it
    fn validate_scope<'a>(
        pipeline: &PipelineSpec,
        deployment: &DeploymentConfig,
        tasks: &'a [TaskSpec],
        path: ScopePath,
        stack: &mut Vec<ScopeFrame<'a>>,
        report: &mut ValidationReport,
    ) -> CompileResult<()> {
        tracing::debug!(scope = %path, tasks = tasks.len(), "validating scope");
        report.scopes += 1;

        stack.push(ScopeFrame::build(tasks, path.clone())?);

        for task in tasks {
            Self::validate_inputs(pipeline, task, stack, report)?;

            match &task.dag {
                Some(sub_dag) => {
                    if sub_dag.tasks.is_empty() {
                        report.add_warning(&format!(
                            "Task '{}': nested DAG has no tasks",
                            path.qualify(&task.name)
                        ));
                    }
                    Self::validate_scope(
                        pipeline,
                        deployment,
                        &sub_dag.tasks,
                        path.child(&task.name),
                        stack,
                        report,
                    )?;
                }
                None => {
                    if deployment.executor(&task.component_ref).is_none() {
                        return Err(CompileError::MissingExecutorSpec {
                            task: path.qualify(&task.name),
                            component: task.component_ref.clone(),
                        });
                    }
                }
            }
        }

        stack.pop();
        Ok(())
    }

    /// Check every input's value source
    fn validate_inputs(
        pipeline: &PipelineSpec,
        task: &TaskSpec,
        stack: &[ScopeFrame<'_>],
        report: &mut ValidationReport,
    ) -> CompileResult<()> {
        let Some(current) = stack.last() else {
            return Ok(());
        };

        for (input, source) in &task.inputs {
            match source {
                ValueSource::Constant(_) => {}
                ValueSource::RuntimeParameter(name) => {
                    if !pipeline.parameters.contains_key(name) {
                        report.add_warning(&format!(
                            "Task '{}': input '{}' reads run parameter '{}' which the pipeline does not declare",
                            current.path.qualify(&task.name),
                            input,
                            name
                        ));
                    }
                }
                ValueSource::TaskOutput {
                    task: reference,
                    param,
                } => {
                    if let Some(warning) = check_task_output(stack, task, input, reference, param)? {
                        report.add_warning(&warning);
                    }
                }
            }
        }

        Ok(())
    }
}

/// Task names must be non-empty and free of the context separator
fn check_name(task: &TaskSpec, path: &ScopePath) -> CompileResult<()> {
    let reason = if task.name.is_empty() {
        "name is empty"
    } else if task.name.contains(CONTEXT_SEPARATOR) {
        "name must not contain '/'"
    } else {
        return Ok(());
    };

    Err(CompileError::InvalidTaskName {
        task: path.qualify(&task.name),
        reason: reason.to_string(),
    })
}

/// Check that `task`, declared in the innermost frame, may read `param`
/// from `reference` through input `input`
///
/// The reference must resolve to a task in this scope or an enclosing one
/// that declares the output, and reading it must not close a cycle. Returns
/// a warning when the read is not backed by a dependency.
pub(crate) fn check_task_output(
    stack: &[ScopeFrame<'_>],
    task: &TaskSpec,
    input: &str,
    reference: &str,
    param: &str,
) -> CompileResult<Option<String>> {
    let Some(current) = stack.last() else {
        return Ok(None);
    };
    let qualified = current.path.qualify(&task.name);

    let dangling = || CompileError::DanglingTaskOutputReference {
        task: qualified.clone(),
        input: input.to_string(),
        reference: reference.to_string(),
        param: param.to_string(),
    };

    if reference == task.name {
        return Err(CompileError::CyclicDependency {
            scope: current.path.to_string(),
            tasks: vec![task.name.clone(), task.name.clone()],
        });
    }

    let (depth, referenced) = resolve_reference(stack, reference).ok_or_else(dangling)?;

    // The consuming task, or the composite enclosing it, at the depth of
    // the reference
    let consumer = stack
        .get(depth + 1)
        .and_then(|inner| inner.path.segments().get(depth))
        .map(String::as_str)
        .unwrap_or(&task.name);
    if consumer == reference {
        return Err(CompileError::CyclicDependency {
            scope: stack[depth].path.to_string(),
            tasks: vec![reference.to_string(), task.name.clone(), reference.to_string()],
        });
    }
    if stack[depth].dag.depends_on(reference, consumer) {
        return Err(CompileError::CyclicDependency {
            scope: stack[depth].path.to_string(),
            tasks: vec![consumer.to_string(), reference.to_string(), consumer.to_string()],
        });
    }

    if !referenced.outputs.contains(param) {
        return Err(dangling());
    }

    if depth + 1 == stack.len() && !current.dag.depends_on(&task.name, reference) {
        return Ok(Some(format!(
            "Task '{}': input '{}' reads '{}' but does not depend on it; \
             the engine will order the tasks through the context reference only",
            qualified, input, reference
        )));
    }

    Ok(None)
}

/// Find the nearest scope (innermost first) declaring `name`
pub(crate) fn resolve_reference<'a>(
    stack: &[ScopeFrame<'a>],
    name: &str,
) -> Option<(usize, &'a TaskSpec)> {
    stack.iter().enumerate().rev().find_map(|(depth, frame)| {
        frame
            .tasks
            .iter()
            .find(|t| t.name == name)
            .map(|t| (depth, t))
    })
}

/// Outcome of a successful validation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
    pub counts: TaskCounts,
    pub scopes: usize,
}

impl ValidationReport {
    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ExecutorSpec;
    use std::collections::BTreeMap;

    fn pipeline(tasks: Vec<TaskSpec>) -> PipelineSpec {
        PipelineSpec {
            name: "test".into(),
            description: None,
            parameters: BTreeMap::new(),
            tasks,
        }
    }

    fn deployment(components: &[&str]) -> DeploymentConfig {
        components.iter().fold(DeploymentConfig::default(), |d, c| {
            d.with_executor(*c, ExecutorSpec::new("alpine", &["echo"]))
        })
    }

    fn output_of(task: &str, param: &str) -> ValueSource {
        ValueSource::TaskOutput {
            task: task.into(),
            param: param.into(),
        }
    }

    #[test]
    fn test_empty_name_is_checked_first() {
        // Also carries a cycle, which must not be reported
        let mut p = pipeline(vec![
            TaskSpec::leaf("a", "comp").after("b"),
            TaskSpec::leaf("b", "comp").after("a"),
        ]);
        p.name = String::new();

        let result = PipelineValidator::validate(&p, &deployment(&[]));
        assert_eq!(result, Err(CompileError::EmptyPipelineName));
    }

    #[test]
    fn test_duplicate_names() {
        let p = pipeline(vec![TaskSpec::leaf("dup", "comp"), TaskSpec::leaf("dup", "comp")]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert!(matches!(
            result,
            Err(CompileError::DuplicateTaskName { ref task, .. }) if task == "dup"
        ));
    }

    #[test]
    fn test_duplicate_names_in_nested_scope_carry_path() {
        let p = pipeline(vec![TaskSpec::composite(
            "outer",
            vec![TaskSpec::leaf("x", "comp"), TaskSpec::leaf("x", "comp")],
        )]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert_eq!(
            result,
            Err(CompileError::DuplicateTaskName {
                scope: "root/outer".into(),
                task: "x".into()
            })
        );
    }

    #[test]
    fn test_same_name_in_different_scopes_is_fine() {
        let p = pipeline(vec![
            TaskSpec::leaf("x", "comp"),
            TaskSpec::composite("outer", vec![TaskSpec::leaf("x", "comp")]),
        ]);

        assert!(PipelineValidator::validate(&p, &deployment(&["comp"])).is_ok());
    }

    #[test]
    fn test_invalid_name() {
        let p = pipeline(vec![TaskSpec::leaf("a/b", "comp")]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert!(matches!(result, Err(CompileError::InvalidTaskName { .. })));
    }

    #[test]
    fn test_cycle() {
        let p = pipeline(vec![
            TaskSpec::leaf("a", "comp").after("b"),
            TaskSpec::leaf("b", "comp").after("a"),
        ]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert!(matches!(result, Err(CompileError::CyclicDependency { .. })));
    }

    #[test]
    fn test_dangling_task_output_unknown_task() {
        let p = pipeline(vec![
            TaskSpec::leaf("a", "comp").with_input("x", output_of("ghost", "out"))
        ]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert_eq!(
            result,
            Err(CompileError::DanglingTaskOutputReference {
                task: "root/a".into(),
                input: "x".into(),
                reference: "ghost".into(),
                param: "out".into(),
            })
        );
    }

    #[test]
    fn test_dangling_task_output_undeclared_param() {
        let p = pipeline(vec![
            TaskSpec::leaf("a", "comp").with_output("out"),
            TaskSpec::leaf("b", "comp")
                .after("a")
                .with_input("x", output_of("a", "missing")),
        ]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert!(matches!(
            result,
            Err(CompileError::DanglingTaskOutputReference { ref param, .. }) if param == "missing"
        ));
    }

    #[test]
    fn test_task_output_from_ancestor_scope() {
        let p = pipeline(vec![
            TaskSpec::leaf("prep", "comp").with_output("data"),
            TaskSpec::composite(
                "train",
                vec![TaskSpec::leaf("fit", "comp").with_input("data", output_of("prep", "data"))],
            )
            .after("prep"),
        ]);

        let report = PipelineValidator::validate(&p, &deployment(&["comp"])).unwrap();
        assert!(!report.has_warnings());
        assert_eq!(report.scopes, 2);
    }

    #[test]
    fn test_task_output_from_enclosing_composite_is_cyclic() {
        let mut outer = TaskSpec::composite(
            "outer",
            vec![TaskSpec::leaf("x", "comp").with_input("v", output_of("outer", "out"))],
        );
        outer.outputs.insert("out".into());
        let p = pipeline(vec![outer]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert!(matches!(result, Err(CompileError::CyclicDependency { .. })));
    }

    #[test]
    fn test_reading_a_downstream_task_is_cyclic() {
        let p = pipeline(vec![
            TaskSpec::leaf("a", "comp").with_input("x", output_of("c", "out")),
            TaskSpec::leaf("b", "comp").after("a"),
            TaskSpec::leaf("c", "comp").after("b").with_output("out"),
        ]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert_eq!(
            result,
            Err(CompileError::CyclicDependency {
                scope: "root".into(),
                tasks: vec!["a".into(), "c".into(), "a".into()],
            })
        );
    }

    #[test]
    fn test_nested_task_reading_a_dependent_of_its_composite_is_cyclic() {
        let p = pipeline(vec![
            TaskSpec::composite(
                "outer",
                vec![TaskSpec::leaf("x", "comp").with_input("v", output_of("after", "out"))],
            ),
            TaskSpec::leaf("after", "comp").after("outer").with_output("out"),
        ]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert!(matches!(
            result,
            Err(CompileError::CyclicDependency { ref tasks, .. }) if tasks[0] == "outer"
        ));
    }

    #[test]
    fn test_task_output_without_dependency_warns() {
        let p = pipeline(vec![
            TaskSpec::leaf("a", "comp").with_output("out"),
            TaskSpec::leaf("b", "comp").with_input("x", output_of("a", "out")),
        ]);

        let report = PipelineValidator::validate(&p, &deployment(&["comp"])).unwrap();
        assert!(report.has_warnings());
        assert!(report.warnings[0].contains("does not depend on it"));
    }

    #[test]
    fn test_undeclared_runtime_parameter_warns() {
        let p = pipeline(vec![TaskSpec::leaf("a", "comp")
            .with_input("lr", ValueSource::RuntimeParameter("lr".into()))]);

        let report = PipelineValidator::validate(&p, &deployment(&["comp"])).unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("'lr'")));
    }

    #[test]
    fn test_missing_executor_spec() {
        let p = pipeline(vec![TaskSpec::composite(
            "outer",
            vec![TaskSpec::leaf("inner", "comp-unknown")],
        )]);

        let result = PipelineValidator::validate(&p, &deployment(&["comp"]));
        assert_eq!(
            result,
            Err(CompileError::MissingExecutorSpec {
                task: "root/outer/inner".into(),
                component: "comp-unknown".into()
            })
        );
    }

    #[test]
    fn test_composite_needs_no_executor() {
        let p = pipeline(vec![TaskSpec::composite("outer", vec![TaskSpec::leaf("x", "comp")])]);

        let report = PipelineValidator::validate(&p, &deployment(&["comp"])).unwrap();
        assert_eq!(report.counts, TaskCounts { leaf: 1, composite: 1 });
    }
}
