// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Graph command - visualize a pipeline or its compiled run as a graph

use miette::Result;
use std::path::PathBuf;

use super::{load_inputs, GraphFormat};
use crate::config::DagcConfig;
use crate::pipeline::{DagBuilder, PipelineSpec, ScopePath};
use crate::workflow::{RunGraph, WorkflowRun};

/// Run the graph command
pub fn run(
    config: &DagcConfig,
    pipeline_path: PathBuf,
    format: GraphFormat,
    compiled: bool,
    deployment_path: Option<PathBuf>,
) -> Result<()> {
    let output = match (compiled, deployment_path) {
        (true, Some(deployment_path)) => {
            let (pipeline, deployment) = load_inputs(&pipeline_path, &deployment_path)?;
            let run = config.compiler()?.compile(&pipeline, &deployment)?;
            render_run(&run, format)
        }
        (true, None) => {
            return Err(miette::miette!(
                "--compiled needs a deployment config (-d <deployment>)"
            ));
        }
        (false, _) => {
            let pipeline = PipelineSpec::from_file(&pipeline_path)?;
            let dag = DagBuilder::build(&pipeline.tasks, &ScopePath::root())?;

            match format {
                GraphFormat::Text => dag.to_text(&pipeline.tasks),
                GraphFormat::Dot => dag.to_dot(),
                GraphFormat::Mermaid => dag.to_mermaid(),
            }
        }
    };

    println!("{}", output.trim_end());

    Ok(())
}

fn render_run(run: &WorkflowRun, format: GraphFormat) -> String {
    let graph = RunGraph::from_run(run);

    match format {
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
        GraphFormat::Text => run
            .root_dag()
            .iter()
            .enumerate()
            .map(|(i, task)| {
                let mut line = format!("{}. {} ({})", i + 1, task.name, task.template());
                if !task.run_after.is_empty() {
                    let after: Vec<&str> = task.run_after.iter().map(String::as_str).collect();
                    line.push_str(&format!(" [after: {}]", after.join(", ")));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
