// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Pipeline results

use serde::Serialize;
use std::time::Duration;

use super::StepName;
use crate::errors::BuildgateError;

/// Exit status reported when a step is stopped by cancellation
pub const EXIT_CANCELLED: i32 = 130;
/// Exit status reported when a step exceeds its timeout
pub const EXIT_TIMED_OUT: i32 = 124;
/// Exit status reported when a step's program cannot be started
pub const EXIT_SPAWN_FAILED: i32 = 127;

/// Why a step failed
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFailureKind {
    /// Non-zero exit
    ExitStatus { code: i32 },
    /// Output contained warnings the platform treats as fatal
    LinkerWarnings { code: i32, warnings: Vec<String> },
    TimedOut { seconds: u64 },
    Cancelled,
    SpawnFailed { program: String, message: String },
}

impl StepFailureKind {
    /// Exit status the pipeline reports for this failure; never 0
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::ExitStatus { code } => nonzero(*code),
            Self::LinkerWarnings { code, .. } => nonzero(*code),
            Self::TimedOut { .. } => EXIT_TIMED_OUT,
            Self::Cancelled => EXIT_CANCELLED,
            Self::SpawnFailed { .. } => EXIT_SPAWN_FAILED,
        }
    }
}

fn nonzero(code: i32) -> i32 {
    if code == 0 {
        1
    } else {
        code
    }
}

/// Summary of one pipeline run. Built once when the run ends.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PipelineResult {
    /// Steps that finished successfully, in order
    pub completed_steps: Vec<String>,
    /// First step that failed, if any
    pub failed_step: Option<String>,
    /// 0 iff every step succeeded
    pub exit_status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailureKind>,
}

impl PipelineResult {
    pub(crate) fn succeeded(completed: &[StepName]) -> Self {
        Self {
            completed_steps: completed.iter().map(ToString::to_string).collect(),
            failed_step: None,
            exit_status: 0,
            failure: None,
        }
    }

    pub(crate) fn failed(completed: &[StepName], step: StepName, failure: StepFailureKind) -> Self {
        Self {
            completed_steps: completed.iter().map(ToString::to_string).collect(),
            failed_step: Some(step.to_string()),
            exit_status: failure.exit_status(),
            failure: Some(failure),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// The failure as a diagnostic error, if the run failed
    pub fn to_error(&self) -> Option<BuildgateError> {
        let step = self.failed_step.clone()?;
        let failure = self.failure.as_ref()?;

        Some(match failure {
            StepFailureKind::ExitStatus { code } => BuildgateError::step_failed(&step, *code),
            StepFailureKind::LinkerWarnings { code, warnings } => {
                BuildgateError::linker_warnings(&step, *code, warnings.clone())
            }
            StepFailureKind::TimedOut { seconds } => BuildgateError::StepTimedOut {
                step,
                seconds: *seconds,
            },
            StepFailureKind::Cancelled => BuildgateError::StepCancelled { step },
            StepFailureKind::SpawnFailed { program, message } => BuildgateError::StepSpawnFailed {
                step,
                program: program.clone(),
                error: message.clone(),
                help: None,
            },
        })
    }
}

/// Per-step record kept for reporting
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: StepName,
    pub duration: Duration,
    pub success: bool,
    /// Captured output; empty when the step never finished
    #[serde(skip)]
    pub stdout: String,
    #[serde(skip)]
    pub stderr: String,
}

/// A pipeline result plus timing and captured output
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub result: PipelineResult,
    pub steps: Vec<StepReport>,
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_exit_with_warnings_is_still_failure() {
        let failure = StepFailureKind::LinkerWarnings {
            code: 0,
            warnings: vec!["ld: warning: x".into()],
        };
        assert_eq!(failure.exit_status(), 1);
    }

    #[test]
    fn test_failed_result_maps_to_step_error() {
        let result = PipelineResult::failed(
            &[StepName::FetchDependencies],
            StepName::Configure,
            StepFailureKind::ExitStatus { code: 2 },
        );

        assert!(!result.success());
        assert_eq!(result.completed_steps, vec!["fetch_dependencies"]);
        assert_eq!(result.failed_step.as_deref(), Some("configure"));
        assert_eq!(result.exit_status, 2);

        let err = result.to_error().unwrap();
        assert!(matches!(
            err,
            BuildgateError::StepFailure { ref step, exit_code: 2, .. } if step == "configure"
        ));
    }

    #[test]
    fn test_successful_result_has_no_error() {
        let result = PipelineResult::succeeded(&StepName::ALL);
        assert!(result.success());
        assert!(result.to_error().is_none());
    }

    #[test]
    fn test_special_exit_statuses() {
        assert_eq!(StepFailureKind::Cancelled.exit_status(), EXIT_CANCELLED);
        assert_eq!(StepFailureKind::TimedOut { seconds: 5 }.exit_status(), EXIT_TIMED_OUT);
    }

    #[test]
    fn test_result_serializes_failure_kind() {
        let result = PipelineResult::failed(
            &[StepName::FetchDependencies, StepName::Configure],
            StepName::Build,
            StepFailureKind::LinkerWarnings {
                code: 1,
                warnings: vec!["ld: warning: dup".into()],
            },
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failed_step"], "build");
        assert_eq!(json["failure"]["kind"], "linker_warnings");
        assert_eq!(json["failure"]["warnings"][0], "ld: warning: dup");
    }
}
