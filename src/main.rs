// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! dagc - ML pipeline DAG compiler
//!
//! Compile pipeline DAGs and deployment configs into Tekton PipelineRuns.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dagc::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "dagc=debug" } else { "dagc=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = dagc::cli::load_config(cli.config.as_deref())?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Compile {
            pipeline,
            deployment,
            output,
            format,
        } => dagc::cli::compile::run(&config, pipeline, deployment, output, format, cli.verbose),
        Commands::Validate {
            pipeline,
            deployment,
        } => dagc::cli::validate::run(&config, pipeline, deployment, cli.verbose),
        Commands::Graph {
            pipeline,
            format,
            compiled,
            deployment,
        } => dagc::cli::graph::run(&config, pipeline, format, compiled, deployment),
    }
}
