// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! buildgate - Gated Cross-Compile Orchestrator
//!
//! Run an expensive platform build only after an upstream build succeeds.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buildgate::cli::run::RunArgs;
use buildgate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buildgate=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if !buildgate::utils::should_use_colors() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    let status = match cli.command {
        Commands::Run {
            event,
            target,
            dry_run,
            skip_tool_check,
            format,
        } => {
            let args = RunArgs {
                event,
                target,
                dry_run,
                skip_tool_check,
                format,
            };
            buildgate::cli::run::run(args, cli.config, cli.verbose).await?
        }
        Commands::Gate {
            event,
            check,
            format,
        } => buildgate::cli::gate::run(event, check, format, cli.config, cli.verbose).await?,
        Commands::Plan { target, format } => {
            buildgate::cli::plan::run(target, format, cli.config, cli.verbose).await?;
            0
        }
        Commands::Validate => {
            buildgate::cli::validate::run(cli.config, cli.verbose).await?;
            0
        }
        Commands::Init { force } => {
            buildgate::cli::init::run(force, cli.verbose).await?;
            0
        }
    };

    if status != 0 {
        std::process::exit(status);
    }

    Ok(())
}
