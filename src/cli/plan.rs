// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Plan command - show the composed configuration and steps

use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use super::{load_config, OutputFormat, TargetArgs};
use crate::environment::BuildConfiguration;
use crate::pipeline::{PipelinePlan, StepName};
use crate::utils;

/// Serializable view of a plan
#[derive(Debug, Serialize)]
pub struct PlanView<'a> {
    pub configuration: &'a BuildConfiguration,
    pub steps: Vec<StepView>,
}

#[derive(Debug, Serialize)]
pub struct StepView {
    pub name: StepName,
    pub command: String,
    /// Linker warnings fail this step
    pub guarded: bool,
}

impl<'a> PlanView<'a> {
    pub fn new(configuration: &'a BuildConfiguration, plan: &PipelinePlan) -> Self {
        let steps = plan
            .steps
            .iter()
            .map(|step| StepView {
                name: step.name,
                command: step.command.to_string(),
                guarded: step.warning_guard.is_some(),
            })
            .collect();

        Self {
            configuration,
            steps,
        }
    }
}

/// Run the plan command
pub async fn run(
    target: TargetArgs,
    format: OutputFormat,
    config_path: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref(), verbose)?;
    target.apply(&mut config);

    let configuration = config.composer().compose(&config.request())?;
    let plan = PipelinePlan::for_configuration(&configuration, &config.toolchain, &config.step_env());

    match format {
        OutputFormat::Json => {
            let view = PlanView::new(&configuration, &plan);
            println!("{}", serde_json::to_string_pretty(&view).into_diagnostic()?);
        }
        OutputFormat::Text => print_plan_text(&configuration, &plan),
    }

    Ok(())
}

/// Human-readable plan, shared with `run --dry-run`
pub fn print_plan_text(configuration: &BuildConfiguration, plan: &PipelinePlan) {
    utils::print_header(&format!("Build plan for {}", configuration.platform));
    utils::print_field("System", &configuration.system_name);
    utils::print_field("Architectures", &configuration.architecture_descriptor());
    utils::print_field("Build type", &configuration.build_type.to_string());
    utils::print_field("Linker", &configuration.linker_policy.to_string());
    if let Some(ref target) = configuration.deployment_target {
        utils::print_field("Deploy target", target);
    }

    utils::print_section("Steps");
    for (index, step) in plan.steps.iter().enumerate() {
        let guard = if step.warning_guard.is_some() {
            " [linker warnings fatal]".yellow().to_string()
        } else {
            String::new()
        };
        println!("  {}. {}{}", index + 1, step.name.to_string().bold(), guard);
        println!("     {}", utils::code(&step.command.to_string()));
    }
}
