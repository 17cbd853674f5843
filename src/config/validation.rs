// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Configuration validation
//!
//! Catches mistakes before the gate is evaluated or any step is spawned.

use super::BuildgateConfig;
use crate::environment::{BuildType, PlatformRequest};
use crate::errors::BuildgateError;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration
    pub fn validate(config: &BuildgateConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if config.upstream_workflow.trim().is_empty() {
            result.add_error("'upstream_workflow' is empty; the gate could never open");
        }

        if config.toolchain.fetch_command.trim().is_empty() {
            result.add_error("'toolchain.fetch_command' is empty");
        } else if config.toolchain.fetch_command.trim().contains(char::is_whitespace) {
            result.add_warning(&format!(
                "'toolchain.fetch_command' ({}) contains spaces; it is run as a single program with no arguments",
                config.toolchain.fetch_command
            ));
        }

        if config.toolchain.cmake.trim().is_empty() {
            result.add_error("'toolchain.cmake' is empty");
        }

        if config.toolchain.generator.trim().is_empty() {
            result.add_error("'toolchain.generator' is empty");
        }

        if config.toolchain.build_dir == config.toolchain.source_dir {
            result.add_warning("'toolchain.build_dir' equals 'source_dir'; in-source builds are not recommended");
        }

        // Every profile must compose, not only the selected one
        let composer = config.composer();
        for (name, profile) in &config.platforms {
            if profile.system_name.trim().is_empty() {
                result.add_error(&format!("Platform '{}': 'system_name' is empty", name));
            }

            if let Err(BuildgateError::EmptyArchitectures { .. }) =
                composer.compose(&PlatformRequest::new(name.clone(), BuildType::Release))
            {
                result.add_error(&format!("Platform '{}': no architectures listed", name));
            }
        }

        if composer.profile(&config.platform).is_none() {
            result.add_error(&format!(
                "Platform '{}' is unknown (known: {})",
                config.platform,
                composer.platforms().join(", ")
            ));
        }

        if config.step_timeout_secs == 0 {
            result.add_warning("'step_timeout_secs' is 0; a hung step will never be stopped");
        }

        for key in config.env.keys() {
            if key.is_empty() || key.contains('=') {
                result.add_error(&format!("Invalid environment variable name: '{}'", key));
            }
        }

        result
    }
}

/// Result of configuration validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
