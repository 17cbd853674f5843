// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Execution pipeline
//!
//! Plans the four build steps for a configuration and runs them strictly in
//! sequence, short-circuiting on the first failure.

mod cancel;
mod definition;
mod executor;
mod result;

pub use cancel::{CancelTrigger, Cancellation};
pub use definition::{CommandSpec, PipelinePlan, PipelineStep, StepName};
pub use executor::{ExecutionOptions, PipelineExecutor};
pub use result::{
    PipelineResult, PipelineRun, StepFailureKind, StepReport, EXIT_CANCELLED, EXIT_SPAWN_FAILED,
    EXIT_TIMED_OUT,
};
