// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Validate command - check a pipeline against its deployment config

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::load_inputs;
use crate::config::DagcConfig;

/// Run the validate command
pub fn run(
    config: &DagcConfig,
    pipeline_path: PathBuf,
    deployment_path: PathBuf,
    verbose: bool,
) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let (pipeline, deployment) = match load_inputs(&pipeline_path, &deployment_path) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("  {} Failed to load inputs", "✗".red());
            eprintln!();
            return Err(e.into());
        }
    };

    println!("  {} Pipeline and deployment config parsed", "✓".green());

    let report = match config.compiler()?.validate(&pipeline, &deployment) {
        Ok(report) => report,
        Err(e) => {
            println!();
            println!("{}:", "Errors".red().bold());
            println!("  {} {}", "✗".red(), e);
            println!();
            return Err(e.into());
        }
    };

    if report.has_warnings() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &report.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", pipeline.name);
        println!("  Leaf tasks: {}", report.counts.leaf);
        println!("  Composite tasks: {}", report.counts.composite);
        println!("  Scopes: {}", report.scopes);
        println!(
            "  Compiled tasks: {}",
            report.counts.expected_workflow_tasks()
        );
        for task in &pipeline.tasks {
            let deps = if task.dependencies.is_empty() {
                String::new()
            } else {
                let names: Vec<&str> = task.dependencies.iter().map(String::as_str).collect();
                format!(" [depends: {}]", names.join(", "))
            };
            let kind = if task.is_composite() {
                "dag"
            } else {
                task.component_ref.as_str()
            };
            println!("    - {} ({}){}", task.name, kind, deps.dimmed());
        }
    }

    println!();

    if report.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }

    Ok(())
}
