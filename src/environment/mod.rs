// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Environment composer
//!
//! Turns a platform request into a [`BuildConfiguration`]. Composition is a
//! table lookup: nothing about the host machine is inspected, so every
//! runner produces the same configuration for the same request.

mod platform;

pub use platform::{BuildConfiguration, BuildType, LinkerPolicy, PlatformProfile, WarningGuard};

use std::collections::BTreeMap;
use tracing::debug;

use crate::errors::BuildgateError;

/// What the caller wants to build for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRequest {
    pub platform: String,
    pub build_type: BuildType,
}

impl PlatformRequest {
    pub fn new(platform: impl Into<String>, build_type: BuildType) -> Self {
        Self {
            platform: platform.into(),
            build_type,
        }
    }
}

/// Composes build configurations from known platform profiles
#[derive(Debug, Clone)]
pub struct EnvironmentComposer {
    profiles: BTreeMap<String, PlatformProfile>,
}

impl EnvironmentComposer {
    /// Composer with the built-in profiles (`ios`, `macos`)
    pub fn new() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("ios".to_string(), PlatformProfile::ios());
        profiles.insert("macos".to_string(), PlatformProfile::macos());
        Self { profiles }
    }

    /// Add or replace profiles; keys are matched case-insensitively
    pub fn with_profiles<I>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = (String, PlatformProfile)>,
    {
        for (name, profile) in profiles {
            self.profiles.insert(name.to_lowercase(), profile);
        }
        self
    }

    /// Known platform keys, sorted
    pub fn platforms(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Look up a profile by name
    pub fn profile(&self, platform: &str) -> Option<&PlatformProfile> {
        self.profiles.get(&platform.to_lowercase())
    }

    /// Build the configuration for `request`
    pub fn compose(&self, request: &PlatformRequest) -> Result<BuildConfiguration, BuildgateError> {
        let key = request.platform.to_lowercase();

        let profile = self
            .profiles
            .get(&key)
            .ok_or_else(|| BuildgateError::UnknownPlatform {
                platform: request.platform.clone(),
                known: self.platforms().join(", "),
            })?;

        let mut architectures: Vec<String> = Vec::with_capacity(profile.architectures.len());
        for arch in &profile.architectures {
            let arch = arch.trim();
            if !arch.is_empty() && !architectures.iter().any(|a| a == arch) {
                architectures.push(arch.to_string());
            }
        }

        if architectures.is_empty() {
            return Err(BuildgateError::EmptyArchitectures {
                platform: request.platform.clone(),
            });
        }

        let configuration = BuildConfiguration {
            platform: key,
            system_name: profile.system_name.clone(),
            architectures,
            build_type: request.build_type,
            linker_policy: profile.linker_policy,
            deployment_target: profile.deployment_target.clone(),
        };

        debug!(
            platform = %configuration.platform,
            architectures = %configuration.architecture_descriptor(),
            linker_policy = %configuration.linker_policy,
            "composed build configuration"
        );

        Ok(configuration)
    }
}

impl Default for EnvironmentComposer {
    fn default() -> Self {
        Self::new()
    }
}
