// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Run command - gate, compose and execute the pipeline

use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::warn;

use super::plan::{print_plan_text, PlanView};
use super::{load_config, EventArgs, OutputFormat, TargetArgs};
use crate::config::{BuildgateConfig, ConfigValidator};
use crate::errors::{BuildgateError, RecoverySuggestion};
use crate::executors::ProcessExecutor;
use crate::gate::{GateDecision, UpstreamEvent};
use crate::pipeline::{CancelTrigger, Cancellation, ExecutionOptions};
use crate::utils;
use crate::workflow::{GatedBuild, RunOutcome};

/// Options of the run command
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub event: EventArgs,
    pub target: TargetArgs,
    pub dry_run: bool,
    pub skip_tool_check: bool,
    pub format: OutputFormat,
}

/// Run the gated build. Returns the process exit status.
pub async fn run(args: RunArgs, config_path: Option<PathBuf>, verbose: bool) -> Result<i32> {
    let mut config = load_config(config_path.as_deref(), verbose)?;
    args.target.apply(&mut config);

    let validation = ConfigValidator::validate(&config);
    if !validation.is_valid() {
        eprintln!("{}", "Configuration is invalid:".red().bold());
        for error in &validation.errors {
            utils::print_error(error);
        }
        return Err(miette::miette!("Configuration is invalid"));
    }

    if validation.has_warnings() && verbose {
        eprintln!("{}", "Configuration warnings:".yellow().bold());
        for warning in &validation.warnings {
            utils::print_warning(warning);
        }
        eprintln!();
    }

    let event = args.event.load(&config)?;
    let build = GatedBuild::from_config(&config, Box::new(ProcessExecutor::new()));

    let working_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    if args.dry_run {
        return dry_run(&build, event.as_ref(), args.format);
    }

    // Tools only matter once the gate would open
    let gate_opens = event.as_ref().is_some_and(|e| build.gate().should_run(e));
    if gate_opens && !args.skip_tool_check {
        let missing = build.missing_tools(&working_dir).await?;
        if let Some(first) = missing.first() {
            eprintln!("{}", "Missing required tools:".red().bold());
            for tool in &missing {
                utils::print_error(tool);
                eprint!("{}", RecoverySuggestion::install_tool(tool));
            }
            return Err(BuildgateError::tool_not_found(first).into());
        }
    }

    let (trigger, cancellation) = Cancellation::pair();
    spawn_signal_listener(trigger);

    let json = args.format == OutputFormat::Json;
    let options = execution_options(&config, verbose, json);

    let outcome = build
        .run(event.as_ref(), &working_dir, &options, &cancellation)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome).into_diagnostic()?);
    } else {
        report_outcome(&outcome, verbose);
    }

    Ok(outcome.exit_status())
}

fn execution_options(config: &BuildgateConfig, verbose: bool, json: bool) -> ExecutionOptions {
    ExecutionOptions {
        verbose,
        step_timeout: config.step_timeout(),
        progress: utils::stderr_is_interactive(),
        quiet: json,
    }
}

fn dry_run(
    build: &GatedBuild,
    event: Option<&UpstreamEvent>,
    format: OutputFormat,
) -> Result<i32> {
    let decision = build.gate().evaluate(event);
    let (configuration, plan) = build.plan()?;

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "dry_run": true,
                "gate": decision,
                "plan": PlanView::new(&configuration, &plan),
            });
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Text => {
            match decision {
                GateDecision::Open => println!("{}", "Gate would open".green().bold()),
                GateDecision::Skipped { ref reason } => {
                    println!("{} {}", "Gate would stay closed:".yellow().bold(), reason)
                }
            }
            println!();
            print_plan_text(&configuration, &plan);
            println!();
            println!("{}", "Dry run: no steps were executed".dimmed());
        }
    }

    Ok(0)
}

fn report_outcome(outcome: &RunOutcome, verbose: bool) {
    match outcome {
        RunOutcome::Skipped { reason } => {
            utils::print_skipped(&format!("Build skipped: {}", reason));
        }
        RunOutcome::Ran { run, .. } => {
            let Some(error) = run.result.to_error() else {
                return;
            };

            let suggestion = error.step().map(RecoverySuggestion::for_step);

            eprintln!();
            eprintln!("{:?}", miette::Report::new(error));

            if let Some(suggestion) = suggestion.filter(|_| verbose) {
                eprint!("{}", suggestion);
            }
        }
    }
}

/// Cancel the running step on Ctrl-C or SIGTERM
fn spawn_signal_listener(trigger: CancelTrigger) {
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("interrupt received, stopping the running step");
        trigger.cancel();
    });
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_follows_stderr_terminal() {
        let options = execution_options(&BuildgateConfig::default(), false, false);
        assert_eq!(options.progress, console::Term::stderr().is_term());
        assert_eq!(options.step_timeout, Some(std::time::Duration::from_secs(3600)));
        assert!(!options.quiet);
    }

    #[test]
    fn test_json_output_is_quiet() {
        let options = execution_options(&BuildgateConfig::default(), true, true);
        assert!(options.quiet);
        assert!(options.verbose);
    }
}
