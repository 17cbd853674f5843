// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Gate command - evaluate the trigger gate without building

use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use super::{load_config, EventArgs, OutputFormat};
use crate::gate::{GateDecision, UpstreamEvent};
use crate::utils;

#[derive(Serialize)]
struct GateReport<'a> {
    workflow: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a UpstreamEvent>,
    #[serde(flatten)]
    decision: &'a GateDecision,
}

/// Run the gate command. Returns the process exit status.
pub async fn run(
    event_args: EventArgs,
    check: bool,
    format: OutputFormat,
    config_path: Option<PathBuf>,
    verbose: bool,
) -> Result<i32> {
    let config = load_config(config_path.as_deref(), verbose)?;
    let event = event_args.load(&config)?;

    let gate = config.trigger_gate();
    let decision = gate.evaluate(event.as_ref());

    match format {
        OutputFormat::Json => {
            let report = GateReport {
                workflow: gate.workflow(),
                event: event.as_ref(),
                decision: &decision,
            };
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Text => {
            utils::print_field("Listening to", gate.workflow());
            if let Some(ref event) = event {
                utils::print_field("Event", &format!("{} ({})", event.workflow, event.outcome));
                if let Some(ref sha) = event.head_sha {
                    utils::print_field("Commit", sha);
                }
            }
            println!();

            match decision {
                GateDecision::Open => println!("{}", "Gate is open".green().bold()),
                GateDecision::Skipped { ref reason } => {
                    println!("{} {}", "Gate is closed:".yellow().bold(), reason)
                }
            }
        }
    }

    Ok(if check && !decision.is_open() { 1 } else { 0 })
}
