// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Process executor
//!
//! Spawns the step's program directly (no shell) and captures its output.
//! On unix each step runs in its own process group; a step abandoned before
//! it exits (timeout, cancellation) takes its whole group down with it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::{ExecutionResult, Executor};
use crate::errors::BuildgateError;
use crate::pipeline::PipelineStep;

/// Runs steps as child processes
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Create a new process executor
    pub fn new() -> Self {
        Self
    }

    /// Relative paths like `./scripts/sync` are taken from the working
    /// directory; bare names are left for PATH lookup.
    fn resolve_program(program: &str, working_dir: &Path) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            working_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Exit code as a shell reports it; death by signal N is 128 + N
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

/// SIGKILLs the step's process group when dropped while still armed
#[cfg(unix)]
struct ProcessGroupGuard {
    pgid: Option<libc::pid_t>,
}

#[cfg(unix)]
impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|pid| libc::pid_t::try_from(pid).ok()),
        }
    }

    /// The step exited on its own; leave whatever it left behind alone
    fn disarm(mut self) {
        self.pgid = None;
    }
}

#[cfg(unix)]
impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            debug!(pgid, "killing abandoned step process group");
            // SAFETY: killpg only sends a signal. The group leader is our
            // unreaped child, so the id still names this group.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(
        &self,
        step: &PipelineStep,
        working_dir: &Path,
    ) -> Result<ExecutionResult, BuildgateError> {
        let program = Self::resolve_program(&step.command.program, working_dir);
        let start = Instant::now();

        debug!(step = %step.name, command = %step.command, "spawning");

        let mut cmd = Command::new(&program);
        cmd.args(&step.command.args)
            .envs(&step.command.env)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| BuildgateError::StepSpawnFailed {
                step: step.name.to_string(),
                program: program.display().to_string(),
                error: e.to_string(),
                help: Some(format!(
                    "Check that '{}' exists and is executable",
                    step.command.program
                )),
            })?;

        #[cfg(unix)]
        let group = ProcessGroupGuard::new(child.id());

        let output = child.wait_with_output().await?;

        #[cfg(unix)]
        group.disarm();

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        Ok(ExecutionResult {
            success: output.status.success(),
            stdout,
            stderr,
            exit_code: exit_code(&output.status),
            duration,
        })
    }

    async fn check_available(&self, program: &str, working_dir: &Path) -> bool {
        which::which_in(program, std::env::var_os("PATH"), working_dir).is_ok()
    }
}
