// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Init command - write a default configuration

use colored::Colorize;
use miette::Result;
use std::path::Path;

use crate::config::CONFIG_FILE_NAMES;
use crate::utils;

const CONFIG_FILE: &str = CONFIG_FILE_NAMES[0];

/// Run the init command
pub async fn run(force: bool, verbose: bool) -> Result<()> {
    println!("{}", "Initializing buildgate configuration...".bold());
    println!();

    if Path::new(CONFIG_FILE).exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            CONFIG_FILE
        ));
    }

    let content = default_template();

    std::fs::write(CONFIG_FILE, &content)
        .map_err(|e| miette::miette!("Failed to write {}: {}", CONFIG_FILE, e))?;

    utils::print_success(&format!("Created {}", CONFIG_FILE));

    println!();
    println!("{}", "Configuration initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to match your toolchain", CONFIG_FILE.cyan());
    println!("  2. Run {} to check it", "buildgate validate".cyan());
    println!("  3. Run {} to see the composed steps", "buildgate plan".cyan());
    println!();

    if verbose {
        println!("{}", "Generated configuration:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", content.dimmed());
    }

    Ok(())
}

fn default_template() -> String {
    r#"# buildgate configuration
version: "1"

# The build runs only after this workflow reports success
upstream_workflow: "Wasm Build"

platform: ios
build_type: release

# Seconds before a step is killed; 0 waits forever
step_timeout_secs: 3600

toolchain:
  fetch_command: ./scripts/fetch-dependencies
  cmake: cmake
  generator: Ninja
  source_dir: .
  build_dir: build
  install_prefix: .buildgate/install

# Extra environment for every step
env: {}

# Override or add platform profiles:
# platforms:
#   ios:
#     system_name: iOS
#     architectures: [arm64, x86_64]
#     linker_policy: warnings_fatal
#     deployment_target: "13.0"
"#
    .to_string()
}
