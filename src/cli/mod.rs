// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for dagc.

pub mod compile;
pub mod graph;
pub mod validate;

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::config::DagcConfig;
use crate::errors::DagcResult;
use crate::pipeline::{DeploymentConfig, PipelineSpec};

/// ML pipeline DAG compiler
///
/// Compile pipeline DAGs and deployment configs into workflow-engine runs.
#[derive(Parser, Debug)]
#[clap(
    name = "dagc",
    version,
    about = "Compile ML pipeline DAGs into Tekton PipelineRuns",
    long_about = None,
    after_help = "Examples:\n\
        dagc validate pipeline.yaml -d deployment.yaml     Check a pipeline\n\
        dagc compile pipeline.yaml -d deployment.yaml      Print the compiled run\n\
        dagc graph pipeline.yaml -f mermaid                Render the task graph\n\n\
        See 'dagc <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ./dagc.toml, then the user config directory)
    #[clap(short, long, global = true, value_name = "FILE", env = "DAGC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a pipeline into a workflow run
    Compile {
        /// Pipeline definition (YAML or JSON)
        pipeline: PathBuf,

        /// Deployment config (YAML or JSON)
        #[clap(short, long)]
        deployment: PathBuf,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[clap(short, long, default_value = "yaml")]
        format: RunFormat,
    },

    /// Validate a pipeline against a deployment config
    Validate {
        /// Pipeline definition (YAML or JSON)
        pipeline: PathBuf,

        /// Deployment config (YAML or JSON)
        #[clap(short, long)]
        deployment: PathBuf,
    },

    /// Show a pipeline as a graph
    Graph {
        /// Pipeline definition (YAML or JSON)
        pipeline: PathBuf,

        /// Output format
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,

        /// Show the compiled run instead of the root DAG
        #[clap(long, requires = "deployment")]
        compiled: bool,

        /// Deployment config, required with --compiled
        #[clap(short, long)]
        deployment: Option<PathBuf>,
    },
}

/// Output format of a compiled run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFormat {
    Yaml,
    Json,
}

impl std::str::FromStr for RunFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Load `dagc.toml` from the explicit path or the default locations
pub fn load_config(explicit: Option<&Path>) -> Result<DagcConfig> {
    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let (config, _) = DagcConfig::discover(explicit, &cwd)?;
    Ok(config)
}

/// Load a pipeline and its deployment config
pub(crate) fn load_inputs(
    pipeline: &Path,
    deployment: &Path,
) -> DagcResult<(PipelineSpec, DeploymentConfig)> {
    Ok((
        PipelineSpec::from_file(pipeline)?,
        DeploymentConfig::from_file(deployment)?,
    ))
}
