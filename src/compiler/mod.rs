// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Pipeline compiler
//!
//! Turns a [`PipelineSpec`] and its [`DeploymentConfig`] into a
//! [`WorkflowRun`]. Compilation is pure: the same inputs always produce the
//! same run, and nothing is emitted when an error is found.
//!
//! ```no_run
//! use dagc::compiler::Compiler;
//! use dagc::pipeline::{DeploymentConfig, PipelineSpec};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PipelineSpec::from_file("pipeline.yaml".as_ref())?;
//! let deployment = DeploymentConfig::from_file("deployment.yaml".as_ref())?;
//!
//! let run = Compiler::default().compile(&pipeline, &deployment)?;
//! println!("{}", run.to_yaml()?);
//! # Ok(())
//! # }
//! ```

mod assembler;
mod context;
mod dag;
mod document;
mod naming;
mod templates;

pub use assembler::{
    source_digest, EngineConfig, WorkflowAssembler, ROOT_TASK_SPEC_PARAM,
    SOURCE_DIGEST_ANNOTATION,
};
pub use context::ContextPropagator;
pub use dag::{
    compile_dag, exit_tasks, published_context, DagCompiler, DriverType, ScopeContext, TaskKind,
};
pub use naming::{sanitize, task_name, NameArena, Role, MAX_NAME_LEN};
pub use templates::{
    driver_params, executor_params, param_ref, publisher_params, result_ref, results,
    TemplateRegistry,
};

use crate::errors::CompileResult;
use crate::pipeline::{DeploymentConfig, PipelineSpec, PipelineValidator, ValidationReport};
use crate::workflow::WorkflowRun;

/// Compiler bound to an engine and a template registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compiler {
    engine: EngineConfig,
    registry: TemplateRegistry,
}

impl Compiler {
    /// Create a compiler, checking the engine settings and registry
    pub fn new(engine: EngineConfig, registry: TemplateRegistry) -> CompileResult<Self> {
        engine.validate()?;
        registry.validate()?;
        Ok(Self { engine, registry })
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Run the static checks without emitting anything
    pub fn validate(
        &self,
        pipeline: &PipelineSpec,
        deployment: &DeploymentConfig,
    ) -> CompileResult<ValidationReport> {
        PipelineValidator::validate(pipeline, deployment)
    }

    /// Validate and compile a pipeline into a run
    pub fn compile(
        &self,
        pipeline: &PipelineSpec,
        deployment: &DeploymentConfig,
    ) -> CompileResult<WorkflowRun> {
        let report = self.validate(pipeline, deployment)?;
        let run = WorkflowAssembler::new(&self.engine, &self.registry).assemble(pipeline, deployment)?;

        tracing::info!(
            pipeline = %pipeline.name,
            leaf = report.counts.leaf,
            composite = report.counts.composite,
            tasks = run.root_dag().len(),
            warnings = report.warnings.len(),
            "compiled pipeline"
        );

        Ok(run)
    }
}

/// Compile with the default engine settings and templates
pub fn compile(pipeline: &PipelineSpec, deployment: &DeploymentConfig) -> CompileResult<WorkflowRun> {
    Compiler::default().compile(pipeline, deployment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CompileError;
    use crate::pipeline::{ExecutorSpec, ScopePath, TaskSpec, ValueSource};
    use crate::workflow::RunGraph;
    use std::collections::{BTreeMap, BTreeSet};

    fn pipeline(name: &str, tasks: Vec<TaskSpec>) -> PipelineSpec {
        PipelineSpec {
            name: name.into(),
            description: None,
            parameters: BTreeMap::new(),
            tasks,
        }
    }

    fn deployment(components: &[&str]) -> DeploymentConfig {
        components.iter().fold(DeploymentConfig::default(), |d, c| {
            d.with_executor(*c, ExecutorSpec::new("alpine", &["sh", "-c"]))
        })
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn after<'r>(run: &'r WorkflowRun, task: &str) -> &'r BTreeSet<String> {
        &run.task(task)
            .unwrap_or_else(|| panic!("task '{}' not compiled", task))
            .run_after
    }

    /// a → b at the root, plus composite `d` running after `b`
    fn nested_pipeline() -> (PipelineSpec, DeploymentConfig) {
        let tasks = vec![
            TaskSpec::leaf("a", "comp").with_output("data"),
            TaskSpec::leaf("b", "comp").after("a"),
            TaskSpec::composite(
                "d",
                vec![
                    TaskSpec::leaf("x", "comp").with_input(
                        "data",
                        ValueSource::TaskOutput {
                            task: "a".into(),
                            param: "data".into(),
                        },
                    ),
                    TaskSpec::leaf("y", "comp"),
                    TaskSpec::leaf("z", "comp").after("x"),
                ],
            )
            .after("b"),
            TaskSpec::leaf("report", "comp").after("d"),
        ];
        (pipeline("nested", tasks), deployment(&["comp"]))
    }

    #[test]
    fn test_task_count() {
        let (pipeline, deployment) = nested_pipeline();

        let run = compile(&pipeline, &deployment).unwrap();
        let counts = pipeline.task_counts();

        assert_eq!(counts.leaf, 6);
        assert_eq!(counts.composite, 1);
        assert_eq!(run.root_dag().len(), counts.expected_workflow_tasks());
        assert_eq!(run.root_dag().len(), 3 * 6 + 1 + 1);
    }

    #[test]
    fn test_two_task_chain() {
        let pipeline = pipeline(
            "chain",
            vec![TaskSpec::leaf("a", "comp"), TaskSpec::leaf("b", "comp").after("a")],
        );

        let run = compile(&pipeline, &deployment(&["comp"])).unwrap();

        assert_eq!(run.root_dag().len(), 7);
        assert_eq!(after(&run, "driver-a"), &set(&["root-driver"]));
        assert_eq!(after(&run, "executor-a"), &set(&["driver-a"]));
        assert_eq!(after(&run, "publisher-a"), &set(&["executor-a"]));
        assert_eq!(after(&run, "driver-b"), &set(&["publisher-a"]));
        assert_eq!(
            run.task("driver-b").unwrap().param_str("upstream-contexts"),
            Some(r#"{"a":"$(tasks.publisher-a.results.context-name)"}"#)
        );
    }

    #[test]
    fn test_composite_dependents_wait_for_nested_sinks() {
        let (pipeline, deployment) = nested_pipeline();

        let run = compile(&pipeline, &deployment).unwrap();

        assert_eq!(after(&run, "dag-driver-d"), &set(&["publisher-b"]));
        assert_eq!(after(&run, "driver-d-x"), &set(&["dag-driver-d"]));
        assert_eq!(after(&run, "driver-d-y"), &set(&["dag-driver-d"]));
        assert_eq!(after(&run, "driver-d-z"), &set(&["publisher-d-x"]));
        assert_eq!(
            after(&run, "driver-report"),
            &set(&["publisher-d-y", "publisher-d-z"])
        );
        assert_eq!(
            run.task("driver-report").unwrap().param_str("upstream-contexts"),
            Some(r#"{"d":"$(tasks.dag-driver-d.results.context-name)"}"#)
        );
    }

    #[test]
    fn test_compiled_run_is_a_single_rooted_dag() {
        let (pipeline, deployment) = nested_pipeline();

        let run = compile(&pipeline, &deployment).unwrap();
        let graph = RunGraph::from_run(&run);

        assert!(graph.is_acyclic());
        assert!(graph.unresolved().is_empty());
        assert_eq!(graph.roots(), vec!["root-driver".to_string()]);
        assert!(graph.has_edge("publisher-a", "driver-d-x"));
    }

    #[test]
    fn test_generated_names_are_unique() {
        let (pipeline, deployment) = nested_pipeline();

        let run = compile(&pipeline, &deployment).unwrap();
        let names: BTreeSet<&str> = run.root_dag().iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names.len(), run.root_dag().len());
    }

    #[test]
    fn test_lookalike_task_names_compile() {
        let pipeline = pipeline(
            "lookalikes",
            vec![
                TaskSpec::leaf("kfp-root", "comp"),
                TaskSpec::leaf("d-x", "comp"),
                TaskSpec::composite("d", vec![TaskSpec::leaf("x", "comp")]),
                TaskSpec::leaf("Train", "comp"),
                TaskSpec::leaf("train", "comp").after("Train"),
            ],
        );

        let run = compile(&pipeline, &deployment(&["comp"])).unwrap();
        let names: BTreeSet<&str> = run.root_dag().iter().map(|t| t.name.as_str()).collect();
        let graph = RunGraph::from_run(&run);

        // 5 leaves, 1 composite, 1 root driver
        assert_eq!(run.root_dag().len(), 3 * 5 + 1 + 1);
        assert_eq!(names.len(), run.root_dag().len());
        assert!(graph.is_acyclic());
        assert_eq!(graph.roots(), vec!["root-driver".to_string()]);
        assert_eq!(
            after(&run, "driver-train"),
            &set(&[task_name(&ScopePath::root(), "Train", Role::Publisher).as_str()])
        );
    }

    #[test]
    fn test_recompilation_is_identical() {
        let (pipeline, deployment) = nested_pipeline();

        let first = compile(&pipeline, &deployment).unwrap();
        let second = compile(&pipeline, &deployment).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.digest().unwrap(), second.digest().unwrap());
    }

    #[test]
    fn test_two_cycle_rejected() {
        let pipeline = pipeline(
            "cycle",
            vec![
                TaskSpec::leaf("a", "comp").after("b"),
                TaskSpec::leaf("b", "comp").after("a"),
            ],
        );

        let result = compile(&pipeline, &deployment(&["comp"]));

        assert!(matches!(
            result,
            Err(CompileError::CyclicDependency { ref scope, .. }) if scope == "root"
        ));
    }

    #[test]
    fn test_dangling_output_reference() {
        let pipeline = pipeline(
            "dangling",
            vec![TaskSpec::leaf("a", "comp").with_input(
                "x",
                ValueSource::TaskOutput {
                    task: "ghost".into(),
                    param: "out".into(),
                },
            )],
        );

        let result = compile(&pipeline, &deployment(&["comp"]));

        assert!(matches!(
            result,
            Err(CompileError::DanglingTaskOutputReference { ref reference, .. }) if reference == "ghost"
        ));
    }

    #[test]
    fn test_empty_name_reported_before_tasks() {
        let pipeline = pipeline("", vec![TaskSpec::leaf("a", "missing").after("nowhere")]);

        let result = compile(&pipeline, &DeploymentConfig::default());

        assert_eq!(result, Err(CompileError::EmptyPipelineName));
    }

    #[test]
    fn test_missing_executor_reports_qualified_path() {
        let (pipeline, _) = nested_pipeline();

        let result = compile(&pipeline, &DeploymentConfig::default());

        assert_eq!(
            result,
            Err(CompileError::MissingExecutorSpec {
                task: "root/a".into(),
                component: "comp".into()
            })
        );
    }

    #[test]
    fn test_custom_engine_and_templates() {
        let engine = EngineConfig {
            root_driver_task: "bootstrap".into(),
            root_execution_prefix: "run".into(),
            ..EngineConfig::default()
        };
        let registry = TemplateRegistry::new("drv", "dag-drv", "exec", "pub").unwrap();
        let compiler = Compiler::new(engine, registry).unwrap();
        let pipeline = pipeline("custom", vec![TaskSpec::leaf("a", "comp")]);

        let run = compiler.compile(&pipeline, &deployment(&["comp"])).unwrap();

        assert_eq!(run.root_dag()[0].name, "bootstrap");
        assert_eq!(run.root_dag()[0].template(), "dag-drv");
        assert_eq!(run.task("driver-a").unwrap().template(), "drv");
        assert_eq!(after(&run, "driver-a"), &set(&["bootstrap"]));
        assert_eq!(
            run.task("publisher-a").unwrap().param_str("context-name"),
            Some("run-$(context.pipelineRun.name)/a")
        );
    }

    #[test]
    fn test_invalid_compiler_settings() {
        let engine = EngineConfig {
            api_version: String::new(),
            ..EngineConfig::default()
        };

        assert!(matches!(
            Compiler::new(engine, TemplateRegistry::default()),
            Err(CompileError::InvalidEngineConfig { .. })
        ));
    }

    #[test]
    fn test_publisher_snapshot() {
        let pipeline = pipeline("snap", vec![TaskSpec::leaf("a", "comp")]);

        let run = compile(&pipeline, &deployment(&["comp"])).unwrap();

        insta::assert_json_snapshot!(run.task("publisher-a").unwrap(), @r###"
        {
          "name": "publisher-a",
          "taskRef": {
            "name": "kfp-executor-publisher"
          },
          "runAfter": [
            "executor-a"
          ],
          "params": [
            {
              "name": "publisher-type",
              "value": "EXECUTOR"
            },
            {
              "name": "execution-id",
              "value": "$(tasks.driver-a.results.execution-id)"
            },
            {
              "name": "executor-output",
              "value": "$(tasks.executor-a.results.executor-output)"
            },
            {
              "name": "context-name",
              "value": "kfp-root-$(context.pipelineRun.name)/a"
            }
          ]
        }
        "###);
    }
}
