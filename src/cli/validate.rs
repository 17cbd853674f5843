// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Validate command - check the configuration

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::{BuildgateConfig, ConfigValidator};
use crate::errors::RecoverySuggestion;
use crate::utils;

/// Run the validate command
pub async fn run(config_path: Option<PathBuf>, verbose: bool) -> Result<()> {
    println!("{}", "Validating configuration...".bold());
    println!();

    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;

    let (config, source) = match BuildgateConfig::discover(config_path.as_deref(), &cwd) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("  {} Failed to load configuration", "✗".red());
            eprintln!();
            return Err(e.into());
        }
    };

    match source {
        Some(ref path) => utils::print_success(&format!("Loaded {}", path.display())),
        None => {
            println!("  {} No configuration file; checking built-in defaults", "○".dimmed());
            if verbose {
                println!();
                print!("{}", RecoverySuggestion::create_config());
            }
        }
    }

    let validation = ConfigValidator::validate(&config);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        let composer = config.composer();
        println!();
        println!("{}:", "Configuration summary".bold());
        println!("  Upstream workflow: {}", config.upstream_workflow);
        println!("  Platform: {} ({})", config.platform, config.build_type);
        println!("  Known platforms: {}", composer.platforms().join(", "));
        match config.step_timeout() {
            Some(limit) => println!("  Step timeout: {}s", limit.as_secs()),
            None => println!("  Step timeout: {}", "disabled".dimmed()),
        }
    }

    println!();

    if !validation.is_valid() {
        Err(miette::miette!("Configuration validation failed"))
    } else if validation.has_warnings() {
        println!("{}", "Configuration is valid but has warnings.".yellow().bold());
        Ok(())
    } else {
        println!("{}", "Configuration is valid!".green().bold());
        Ok(())
    }
}
