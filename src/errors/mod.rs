// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Error types
//!
//! Every failure carries the step or setting that caused it, so an operator
//! can tell what broke from the first line of output.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for buildgate operations
pub type BuildgateResult<T> = Result<T, BuildgateError>;

/// Main error type for buildgate
#[derive(Error, Debug, Diagnostic)]
pub enum BuildgateError {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Unknown platform '{platform}'")]
    #[diagnostic(
        code(buildgate::unknown_platform),
        help("Known platforms: {known}. Add a profile under 'platforms' in .buildgate.yaml")
    )]
    UnknownPlatform { platform: String, known: String },

    #[error("Platform '{platform}' has no architectures")]
    #[diagnostic(
        code(buildgate::empty_architectures),
        help("List at least one architecture, e.g. [arm64, x86_64]")
    )]
    EmptyArchitectures { platform: String },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(buildgate::invalid_config))]
    InvalidConfig {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(buildgate::config_not_found),
        help("Create one with 'buildgate init' or drop the --config flag to use defaults")
    )]
    ConfigNotFound { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // Upstream Event Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read upstream event '{path}': {error}")]
    #[diagnostic(code(buildgate::event_read_error))]
    EventReadError { path: PathBuf, error: String },

    #[error("Upstream event is malformed: {reason}")]
    #[diagnostic(
        code(buildgate::malformed_event),
        help("Expected a workflow_run payload with 'workflow_run.name' and 'workflow_run.status'")
    )]
    MalformedEvent { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Step Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Step '{step}' failed with exit code {exit_code}")]
    #[diagnostic(code(buildgate::step_failed))]
    StepFailure {
        step: String,
        exit_code: i32,
        #[help]
        help: Option<String>,
    },

    #[error("Step '{step}' failed: linker warnings are fatal for this platform")]
    #[diagnostic(code(buildgate::linker_warning))]
    LinkerWarningFailure {
        step: String,
        exit_code: i32,
        warnings: Vec<String>,
        #[help]
        help: Option<String>,
    },

    #[error("Step '{step}' was cancelled")]
    #[diagnostic(code(buildgate::step_cancelled))]
    StepCancelled { step: String },

    #[error("Step '{step}' timed out after {seconds}s")]
    #[diagnostic(
        code(buildgate::step_timed_out),
        help("Raise 'step_timeout_secs' in .buildgate.yaml if the step is legitimately slow")
    )]
    StepTimedOut { step: String, seconds: u64 },

    #[error("Step '{step}' could not start '{program}': {error}")]
    #[diagnostic(code(buildgate::spawn_failed))]
    StepSpawnFailed {
        step: String,
        program: String,
        error: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Tool Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(buildgate::tool_not_found), help("{suggestion}"))]
    ToolNotFound { tool: String, suggestion: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(buildgate::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(buildgate::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(buildgate::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(buildgate::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for BuildgateError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for BuildgateError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for BuildgateError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for BuildgateError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl BuildgateError {
    /// Create a tool not found error with installation suggestion
    pub fn tool_not_found(tool: &str) -> Self {
        let suggestion = match tool {
            "cmake" => "Install CMake 3.21+: https://cmake.org/download/".to_string(),
            "ninja" => "Install Ninja: https://ninja-build.org/".to_string(),
            _ => format!("Install {} and ensure it's in your PATH", tool),
        };

        Self::ToolNotFound {
            tool: tool.to_string(),
            suggestion,
        }
    }

    /// Create a step failure error with a hint derived from the step name
    pub fn step_failed(step: &str, exit_code: i32) -> Self {
        Self::StepFailure {
            step: step.to_string(),
            exit_code,
            help: Some(RecoverySuggestion::for_step(step).action),
        }
    }

    /// Create a linker warning failure listing the offending lines
    pub fn linker_warnings(step: &str, exit_code: i32, warnings: Vec<String>) -> Self {
        let help = warnings.first().map(|first| {
            format!(
                "First warning: {}\nFix the warning or relax 'linker_policy' for this platform",
                first
            )
        });

        Self::LinkerWarningFailure {
            step: step.to_string(),
            exit_code,
            warnings,
            help,
        }
    }

    /// Whether this error is a configuration problem detected before any step ran
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPlatform { .. }
                | Self::EmptyArchitectures { .. }
                | Self::InvalidConfig { .. }
                | Self::ConfigNotFound { .. }
        )
    }

    /// Name of the pipeline step this error belongs to, if any
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::StepFailure { step, .. }
            | Self::LinkerWarningFailure { step, .. }
            | Self::StepCancelled { step }
            | Self::StepTimedOut { step, .. }
            | Self::StepSpawnFailed { step, .. } => Some(step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failure_message_names_step_and_code() {
        let err = BuildgateError::step_failed("configure", 2);
        assert_eq!(err.to_string(), "Step 'configure' failed with exit code 2");
        assert_eq!(err.step(), Some("configure"));
    }

    #[test]
    fn test_linker_warning_help_quotes_first_warning() {
        let err = BuildgateError::linker_warnings(
            "build",
            1,
            vec!["ld: warning: dylib built for newer iOS".into()],
        );

        match &err {
            BuildgateError::LinkerWarningFailure { help, .. } => {
                assert!(help.as_deref().unwrap().contains("dylib built for newer iOS"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.step(), Some("build"));
    }

    #[test]
    fn test_configuration_errors_are_classified() {
        let err = BuildgateError::UnknownPlatform {
            platform: "tvos".into(),
            known: "ios".into(),
        };
        assert!(err.is_configuration_error());
        assert!(err.step().is_none());
        assert!(!BuildgateError::step_failed("build", 1).is_configuration_error());
    }

    #[test]
    fn test_tool_not_found_suggests_install() {
        match BuildgateError::tool_not_found("cmake") {
            BuildgateError::ToolNotFound { suggestion, .. } => {
                assert!(suggestion.contains("cmake.org"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
