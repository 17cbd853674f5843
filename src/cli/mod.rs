// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for buildgate.

pub mod gate;
pub mod init;
pub mod plan;
pub mod run;
pub mod validate;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::config::BuildgateConfig;
use crate::environment::BuildType;
use crate::gate::{UpstreamEvent, UpstreamOutcome};

/// Gated cross-compile orchestrator
///
/// Runs an expensive platform build only after an upstream build succeeded.
#[derive(Parser, Debug)]
#[clap(
    name = "buildgate",
    version,
    about = "Run an expensive cross-compile only after an upstream build succeeds",
    long_about = None,
    after_help = "Examples:\n\
        buildgate gate --outcome success          Check whether the gate would open\n\
        buildgate plan                            Show the composed build steps\n\
        buildgate run --event $GITHUB_EVENT_PATH  Gate, compose and build\n\
        buildgate init                            Write a default .buildgate.yaml\n\n\
        See 'buildgate <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: .buildgate.yaml, then buildgate.toml)
    #[clap(long, global = true, env = "BUILDGATE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the gate and run the pipeline if it opens
    Run {
        #[clap(flatten)]
        event: EventArgs,

        #[clap(flatten)]
        target: TargetArgs,

        /// Show what would run without running it
        #[clap(long)]
        dry_run: bool,

        /// Skip checking that the required tools are installed
        #[clap(long)]
        skip_tool_check: bool,

        /// Output format for the final summary
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Evaluate the gate only
    Gate {
        #[clap(flatten)]
        event: EventArgs,

        /// Exit with status 1 when the gate stays closed
        #[clap(long)]
        check: bool,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the composed build configuration and steps
    Plan {
        #[clap(flatten)]
        target: TargetArgs,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate the configuration file
    Validate,

    /// Write a default .buildgate.yaml
    Init {
        /// Overwrite an existing file
        #[clap(short, long)]
        force: bool,
    },
}

/// Where the upstream event comes from
#[derive(Args, Debug, Clone, Default)]
pub struct EventArgs {
    /// Webhook payload of the triggering event
    #[clap(long, env = "GITHUB_EVENT_PATH", value_name = "FILE")]
    pub event: Option<PathBuf>,

    /// Upstream outcome given directly; takes precedence over --event
    #[clap(long)]
    pub outcome: Option<UpstreamOutcome>,

    /// Upstream workflow name for --outcome (default: the configured one)
    #[clap(long, requires = "outcome")]
    pub workflow: Option<String>,
}

impl EventArgs {
    /// Resolve the event; `None` when nothing describes an upstream run
    pub fn load(&self, config: &BuildgateConfig) -> Result<Option<UpstreamEvent>> {
        if let Some(outcome) = self.outcome {
            let workflow = self
                .workflow
                .clone()
                .unwrap_or_else(|| config.upstream_workflow.clone());
            return Ok(Some(UpstreamEvent::new(workflow, outcome)));
        }

        match &self.event {
            Some(path) => Ok(UpstreamEvent::from_file(path)?),
            None => Ok(None),
        }
    }
}

/// Overrides for what to build
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Platform to build for (default: from configuration)
    #[clap(long, env = "BUILDGATE_PLATFORM")]
    pub platform: Option<String>,

    /// Build type (debug or release)
    #[clap(long)]
    pub build_type: Option<BuildType>,
}

impl TargetArgs {
    /// Apply the overrides to a loaded configuration
    pub fn apply(&self, config: &mut BuildgateConfig) {
        if let Some(ref platform) = self.platform {
            config.platform = platform.clone();
        }
        if let Some(build_type) = self.build_type {
            config.build_type = build_type;
        }
    }
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Load the configuration, reporting where it came from in verbose mode
pub fn load_config(explicit: Option<&Path>, verbose: bool) -> Result<BuildgateConfig> {
    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    let (config, source) = BuildgateConfig::discover(explicit, &cwd)?;

    if verbose {
        match source {
            Some(path) => eprintln!("Using configuration {}", path.display()),
            None => eprintln!("No configuration file found; using defaults"),
        }
    }

    Ok(config)
}
