// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Gated build workflow
//!
//! Gate → compose → execute. The event is consumed once; a closed gate means
//! nothing is composed and no step is spawned.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::config::{BuildgateConfig, ToolchainConfig};
use crate::environment::{BuildConfiguration, EnvironmentComposer, PlatformRequest};
use crate::errors::BuildgateError;
use crate::executors::Executor;
use crate::gate::{GateDecision, TriggerGate, UpstreamEvent};
use crate::pipeline::{Cancellation, ExecutionOptions, PipelineExecutor, PipelinePlan, PipelineRun};

/// What happened to one workflow invocation
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    /// Gate stayed closed; not a failure
    Skipped { reason: String },
    /// Pipeline ran, successfully or not
    Ran {
        configuration: BuildConfiguration,
        run: PipelineRun,
    },
}

impl RunOutcome {
    /// Process exit status for this outcome
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::Skipped { .. } => 0,
            Self::Ran { run, .. } => run.result.exit_status,
        }
    }
}

/// The composed gate, environment and pipeline
pub struct GatedBuild {
    gate: TriggerGate,
    composer: EnvironmentComposer,
    request: PlatformRequest,
    toolchain: ToolchainConfig,
    env: BTreeMap<String, String>,
    pipeline: PipelineExecutor,
}

impl GatedBuild {
    /// Wire everything from a loaded configuration
    pub fn from_config(config: &BuildgateConfig, executor: Box<dyn Executor>) -> Self {
        Self {
            gate: config.trigger_gate(),
            composer: config.composer(),
            request: config.request(),
            toolchain: config.toolchain.clone(),
            env: config.step_env(),
            pipeline: PipelineExecutor::new(executor),
        }
    }

    pub fn gate(&self) -> &TriggerGate {
        &self.gate
    }

    /// Compose the configuration and the step plan without running anything
    pub fn plan(&self) -> Result<(BuildConfiguration, PipelinePlan), BuildgateError> {
        let configuration = self.composer.compose(&self.request)?;
        let plan = PipelinePlan::for_configuration(&configuration, &self.toolchain, &self.env);
        Ok((configuration, plan))
    }

    /// Programs the plan needs that cannot be found
    pub async fn missing_tools(&self, working_dir: &Path) -> Result<Vec<String>, BuildgateError> {
        let (_, plan) = self.plan()?;
        Ok(self.pipeline.missing_tools(&plan, working_dir).await)
    }

    /// Evaluate the gate and, if it opens, run the pipeline
    pub async fn run(
        &self,
        event: Option<&UpstreamEvent>,
        working_dir: &Path,
        options: &ExecutionOptions,
        cancellation: &Cancellation,
    ) -> Result<RunOutcome, BuildgateError> {
        if let GateDecision::Skipped { reason } = self.gate.evaluate(event) {
            info!(%reason, "downstream build skipped");
            return Ok(RunOutcome::Skipped { reason });
        }

        let (configuration, plan) = self.plan()?;
        info!(
            platform = %configuration.platform,
            build_type = %configuration.build_type,
            "running gated build"
        );

        let run = self
            .pipeline
            .execute(&plan, working_dir, options, cancellation)
            .await;

        Ok(RunOutcome::Ran { configuration, run })
    }
}
