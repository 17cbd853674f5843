// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! # buildgate - Gated Cross-Compile Orchestrator
//!
//! `buildgate` runs an expensive platform build only after an upstream build
//! has succeeded.
//!
//! ## Features
//!
//! - **Fail-closed gate** - Anything but a successful "Wasm Build" skips the build
//! - **Environment composition** - iOS builds are universal (arm64 + x86_64) with fatal linker warnings
//! - **Sequential pipeline** - fetch → configure → build → install, stopping at the first failure
//! - **Bounded steps** - Timeouts and Ctrl-C stop the running tool
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a default configuration
//! buildgate init
//!
//! # See what would run
//! buildgate plan
//!
//! # Gate on the triggering workflow_run event and build
//! buildgate run --event "$GITHUB_EVENT_PATH"
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod errors;
pub mod executors;
pub mod gate;
pub mod pipeline;
pub mod utils;
pub mod workflow;

// Re-export commonly used types
pub use config::BuildgateConfig;
pub use environment::{BuildConfiguration, EnvironmentComposer, PlatformRequest};
pub use errors::{BuildgateError, BuildgateResult};
pub use gate::{GateDecision, TriggerGate, UpstreamEvent, UpstreamOutcome};
pub use pipeline::{PipelinePlan, PipelineResult};
pub use workflow::{GatedBuild, RunOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
