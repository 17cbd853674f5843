// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Pipeline executor
//!
//! Runs the plan's steps one at a time and stops at the first failure.
//! Nothing is rolled back; each external tool owns its own atomicity.

use std::path::Path;
use std::time::{Duration, Instant};

use colored::Colorize;
use indicatif::ProgressBar;
use tracing::{info, warn};

use super::{
    Cancellation, PipelinePlan, PipelineResult, PipelineRun, PipelineStep, StepFailureKind,
    StepName, StepReport,
};
use crate::errors::BuildgateError;
use crate::executors::{ExecutionResult, Executor};
use crate::utils::create_spinner;

/// Pipeline execution options
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Print captured output of failed steps
    pub verbose: bool,
    /// Per-step limit; `None` waits indefinitely
    pub step_timeout: Option<Duration>,
    /// Show a spinner for the running step
    pub progress: bool,
    /// Print nothing to stdout; for machine-readable reports
    pub quiet: bool,
}

enum StepOutcome {
    Finished(Result<ExecutionResult, BuildgateError>),
    TimedOut(Duration),
    Cancelled,
}

/// Pipeline executor
pub struct PipelineExecutor {
    executor: Box<dyn Executor>,
}

impl PipelineExecutor {
    /// Create a pipeline executor that runs steps with `executor`
    pub fn new(executor: Box<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Programs from the plan that cannot be found
    pub async fn missing_tools(&self, plan: &PipelinePlan, working_dir: &Path) -> Vec<String> {
        let mut missing = Vec::new();
        for program in plan.programs() {
            if !self.executor.check_available(program, working_dir).await {
                missing.push(program.to_string());
            }
        }
        missing
    }

    /// Execute a plan
    pub async fn execute(
        &self,
        plan: &PipelinePlan,
        working_dir: &Path,
        options: &ExecutionOptions,
        cancellation: &Cancellation,
    ) -> PipelineRun {
        let start = Instant::now();
        let mut completed: Vec<StepName> = Vec::with_capacity(plan.steps.len());
        let mut reports = Vec::with_capacity(plan.steps.len());
        let mut failure = None;

        for step in &plan.steps {
            info!(step = %step.name, "starting step");

            let spinner = (options.progress && !options.quiet)
                .then(|| create_spinner(&format!("{}...", step.name)));
            if spinner.is_none() && !options.quiet {
                println!("  {} {}...", "→".blue(), step.name);
            }

            let step_start = Instant::now();
            let outcome = self.run_step(step, working_dir, options, cancellation).await;
            let (report, step_failure) = classify(step, outcome, step_start.elapsed());

            if !options.quiet {
                print_step_line(spinner, &report, step_failure.as_ref());
            }

            match step_failure {
                None => completed.push(step.name),
                Some(kind) => {
                    warn!(step = %step.name, exit_status = kind.exit_status(), "step failed");
                    if options.verbose {
                        print_captured_output(&report);
                    }
                    reports.push(report);
                    failure = Some((step.name, kind));
                    break;
                }
            }

            reports.push(report);
        }

        let result = match failure {
            None => PipelineResult::succeeded(&completed),
            Some((step, kind)) => PipelineResult::failed(&completed, step, kind),
        };

        let duration = start.elapsed();

        if !options.quiet {
            print_summary(&result, duration);
        }

        PipelineRun {
            result,
            steps: reports,
            duration,
        }
    }

    /// Run one step, bounded by the timeout and the cancellation signal.
    /// Losing either race drops the executor future, which stops the child.
    async fn run_step(
        &self,
        step: &PipelineStep,
        working_dir: &Path,
        options: &ExecutionOptions,
        cancellation: &Cancellation,
    ) -> StepOutcome {
        let run = self.executor.execute(step, working_dir);

        let bounded = async move {
            match options.step_timeout {
                Some(limit) => match tokio::time::timeout(limit, run).await {
                    Ok(result) => StepOutcome::Finished(result),
                    Err(_) => StepOutcome::TimedOut(limit),
                },
                None => StepOutcome::Finished(run.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => StepOutcome::Cancelled,
            outcome = bounded => outcome,
        }
    }
}

/// Decide whether a step passed and build its report
fn classify(
    step: &PipelineStep,
    outcome: StepOutcome,
    elapsed: Duration,
) -> (StepReport, Option<StepFailureKind>) {
    let mut report = StepReport {
        name: step.name,
        duration: elapsed,
        success: false,
        stdout: String::new(),
        stderr: String::new(),
    };

    let failure = match outcome {
        StepOutcome::Cancelled => Some(StepFailureKind::Cancelled),
        StepOutcome::TimedOut(limit) => Some(StepFailureKind::TimedOut {
            seconds: limit.as_secs(),
        }),
        StepOutcome::Finished(Err(BuildgateError::StepSpawnFailed { program, error, .. })) => {
            Some(StepFailureKind::SpawnFailed {
                program,
                message: error,
            })
        }
        StepOutcome::Finished(Err(other)) => Some(StepFailureKind::SpawnFailed {
            program: step.command.program.clone(),
            message: other.to_string(),
        }),
        StepOutcome::Finished(Ok(result)) => {
            let warnings = step
                .warning_guard
                .as_ref()
                .map(|guard| guard.scan(&result.combined_output()))
                .unwrap_or_default();

            let failure = if !warnings.is_empty() {
                Some(StepFailureKind::LinkerWarnings {
                    code: result.exit_code,
                    warnings,
                })
            } else if !result.success {
                Some(StepFailureKind::ExitStatus {
                    code: result.exit_code,
                })
            } else {
                None
            };

            report.stdout = result.stdout;
            report.stderr = result.stderr;
            failure
        }
    };

    report.success = failure.is_none();
    (report, failure)
}

fn print_step_line(spinner: Option<ProgressBar>, report: &StepReport, failure: Option<&StepFailureKind>) {
    let line = match failure {
        None => format!(
            "  {} {} ({:.2}s)",
            "✓".green(),
            report.name.to_string().bold(),
            report.duration.as_secs_f64()
        ),
        Some(kind) => format!(
            "  {} {} {}",
            "✗".red(),
            report.name.to_string().bold(),
            describe_failure(kind).dimmed()
        ),
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    println!("{}", line);
}

fn print_summary(result: &PipelineResult, duration: Duration) {
    println!();
    if result.success() {
        println!(
            "{}",
            format!("Pipeline completed successfully in {:.2}s", duration.as_secs_f64()).green()
        );
    } else {
        println!(
            "{}",
            format!("Pipeline failed after {:.2}s", duration.as_secs_f64()).red()
        );
    }
}

fn describe_failure(kind: &StepFailureKind) -> String {
    match kind {
        StepFailureKind::ExitStatus { code } => format!("failed (exit code {})", code),
        StepFailureKind::LinkerWarnings { warnings, .. } => {
            format!("failed ({} fatal linker warning(s))", warnings.len())
        }
        StepFailureKind::TimedOut { seconds } => format!("timed out after {}s", seconds),
        StepFailureKind::Cancelled => "cancelled".to_string(),
        StepFailureKind::SpawnFailed { program, .. } => format!("could not start '{}'", program),
    }
}

fn print_captured_output(report: &StepReport) {
    if !report.stdout.is_empty() {
        eprintln!("{}", report.stdout.dimmed());
    }
    if !report.stderr.is_empty() {
        eprintln!("{}", report.stderr.dimmed());
    }
}
