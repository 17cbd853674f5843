// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Step executors
//!
//! An executor runs one pipeline step's command to completion. The pipeline
//! decides what a result means; executors only report what happened.

mod process;
#[cfg(test)]
pub(crate) mod scripted;

pub use process::ProcessExecutor;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::errors::BuildgateError;
use crate::pipeline::PipelineStep;

/// Result of running a step's command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether the command exited with status 0
    pub success: bool,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Exit code (-1 when terminated by a signal)
    pub exit_code: i32,

    /// Execution duration
    pub duration: Duration,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(stdout: String, duration: Duration) -> Self {
        Self {
            success: true,
            stdout,
            stderr: String::new(),
            exit_code: 0,
            duration,
        }
    }

    /// Create a failed result
    pub fn failure(stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr,
            exit_code,
            duration,
        }
    }

    /// Standard output followed by standard error
    pub fn combined_output(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        out.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// Trait for step executors
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a step's command and wait for it to finish.
    ///
    /// Dropping the returned future must stop the command; the pipeline
    /// relies on this for timeouts and cancellation.
    async fn execute(
        &self,
        step: &PipelineStep,
        working_dir: &Path,
    ) -> Result<ExecutionResult, BuildgateError>;

    /// Check if a program can be found from `working_dir`
    async fn check_available(&self, program: &str, working_dir: &Path) -> bool;
}
