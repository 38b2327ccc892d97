// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Compile command - emit the workflow run for a pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{load_inputs, RunFormat};
use crate::config::DagcConfig;
use crate::errors::DagcError;

/// Run the compile command
pub fn run(
    config: &DagcConfig,
    pipeline_path: PathBuf,
    deployment_path: PathBuf,
    output: Option<PathBuf>,
    format: RunFormat,
    verbose: bool,
) -> Result<()> {
    let (pipeline, deployment) = load_inputs(&pipeline_path, &deployment_path)?;
    let compiler = config.compiler()?;

    let run = compiler.compile(&pipeline, &deployment)?;

    let rendered = match format {
        RunFormat::Yaml => run.to_yaml()?,
        RunFormat::Json => run.to_json()?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| DagcError::FileWriteError {
                path: path.clone(),
                error: e.to_string(),
            })?;

            eprintln!(
                "{} Compiled '{}' into {} tasks → {}",
                "✓".green(),
                pipeline.name,
                run.root_dag().len(),
                path.display()
            );
            if verbose {
                eprintln!("  Digest: {}", run.digest()?.dimmed());
            }
        }
        None => println!("{}", rendered.trim_end()),
    }

    Ok(())
}
