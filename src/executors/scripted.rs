// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Scripted executor for pipeline tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ExecutionResult, Executor};
use crate::errors::BuildgateError;
use crate::pipeline::{PipelineStep, StepName};

/// What a scripted step does when run
#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    Succeed(String),
    Fail { exit_code: i32, stderr: String },
    /// Never finishes on its own
    Hang,
    SpawnError,
}

/// Executor that replays canned behaviours and records every invocation
#[derive(Clone, Default)]
pub(crate) struct ScriptedExecutor {
    behaviors: HashMap<StepName, Behavior>,
    invoked: Arc<Mutex<Vec<StepName>>>,
}

impl ScriptedExecutor {
    /// Every step succeeds unless overridden
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, step: StepName, behavior: Behavior) -> Self {
        self.behaviors.insert(step, behavior);
        self
    }

    /// Steps started so far, in order
    pub(crate) fn invoked(&self) -> Vec<StepName> {
        self.invoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(
        &self,
        step: &PipelineStep,
        _working_dir: &Path,
    ) -> Result<ExecutionResult, BuildgateError> {
        self.invoked.lock().unwrap().push(step.name);

        match self.behaviors.get(&step.name).cloned() {
            None => Ok(ExecutionResult::success(String::new(), Duration::ZERO)),
            Some(Behavior::Succeed(stdout)) => Ok(ExecutionResult::success(stdout, Duration::ZERO)),
            Some(Behavior::Fail { exit_code, stderr }) => {
                Ok(ExecutionResult::failure(stderr, exit_code, Duration::ZERO))
            }
            Some(Behavior::Hang) => std::future::pending().await,
            Some(Behavior::SpawnError) => Err(BuildgateError::StepSpawnFailed {
                step: step.name.to_string(),
                program: step.command.program.clone(),
                error: "No such file or directory (os error 2)".into(),
                help: None,
            }),
        }
    }

    async fn check_available(&self, _program: &str, _working_dir: &Path) -> bool {
        true
    }
}
