// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Project configuration
//!
//! Loaded from `.buildgate.yaml` (or `buildgate.toml`). Every field has a
//! default, so running without a file builds iOS behind "Wasm Build".

mod validation;

pub use validation::{ConfigValidator, ValidationResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::environment::{BuildType, EnvironmentComposer, PlatformProfile, PlatformRequest};
use crate::errors::BuildgateError;
use crate::gate::{TriggerGate, DEFAULT_UPSTREAM_WORKFLOW};

/// File names searched in the working directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = [".buildgate.yaml", "buildgate.toml"];

/// Configuration from .buildgate.yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildgateConfig {
    /// Config version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Upstream workflow whose success opens the gate
    #[serde(default = "default_upstream_workflow")]
    pub upstream_workflow: String,

    /// Platform to build for
    #[serde(default = "default_platform")]
    pub platform: String,

    /// CMake build type
    #[serde(default)]
    pub build_type: BuildType,

    /// External tools and paths
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Per-step timeout in seconds; 0 disables it
    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,

    /// Extra environment for every step
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Additional or overriding platform profiles
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformProfile>,
}

fn default_version() -> String {
    "1".to_string()
}

fn default_upstream_workflow() -> String {
    DEFAULT_UPSTREAM_WORKFLOW.to_string()
}

fn default_platform() -> String {
    "ios".to_string()
}

fn default_step_timeout() -> u64 {
    3600
}

impl Default for BuildgateConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            upstream_workflow: default_upstream_workflow(),
            platform: default_platform(),
            build_type: BuildType::default(),
            toolchain: ToolchainConfig::default(),
            step_timeout_secs: default_step_timeout(),
            env: BTreeMap::new(),
            platforms: BTreeMap::new(),
        }
    }
}

/// External collaborators invoked by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Zero-argument dependency sync command
    #[serde(default = "default_fetch_command")]
    pub fetch_command: String,

    /// CMake executable
    #[serde(default = "default_cmake")]
    pub cmake: String,

    /// CMake generator
    #[serde(default = "default_generator")]
    pub generator: String,

    /// Source tree
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Build tree
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Scratch install destination
    #[serde(default = "default_install_prefix")]
    pub install_prefix: PathBuf,
}

fn default_fetch_command() -> String {
    "./scripts/fetch-dependencies".to_string()
}

fn default_cmake() -> String {
    "cmake".to_string()
}

fn default_generator() -> String {
    "Ninja".to_string()
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_install_prefix() -> PathBuf {
    PathBuf::from(".buildgate/install")
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            fetch_command: default_fetch_command(),
            cmake: default_cmake(),
            generator: default_generator(),
            source_dir: default_source_dir(),
            build_dir: default_build_dir(),
            install_prefix: default_install_prefix(),
        }
    }
}

impl BuildgateConfig {
    /// Load from a YAML or TOML file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self, BuildgateError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BuildgateError::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => BuildgateError::Io {
                message: format!("{}: {}", path.display(), e),
            },
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, BuildgateError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, BuildgateError> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, BuildgateError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Resolve and load the configuration.
    ///
    /// An explicit path must exist. Otherwise the working directory is
    /// searched, then the per-user config directory, then defaults apply.
    /// Returns the config and the file it came from.
    pub fn discover(
        explicit: Option<&Path>,
        working_dir: &Path,
    ) -> Result<(Self, Option<PathBuf>), BuildgateError> {
        if let Some(path) = explicit {
            let path = working_dir.join(path);
            return Ok((Self::from_file(&path)?, Some(path)));
        }

        let candidates = CONFIG_FILE_NAMES
            .iter()
            .map(|name| working_dir.join(name))
            .chain(user_config_path());

        for candidate in candidates {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loading configuration");
                return Ok((Self::from_file(&candidate)?, Some(candidate)));
            }
        }

        debug!("no configuration file found, using defaults");
        Ok((Self::default(), None))
    }

    /// Gate bound to the configured upstream workflow
    pub fn trigger_gate(&self) -> TriggerGate {
        TriggerGate::new(self.upstream_workflow.clone())
    }

    /// Composer with built-in plus configured profiles
    pub fn composer(&self) -> EnvironmentComposer {
        EnvironmentComposer::new().with_profiles(self.platforms.clone())
    }

    /// The platform and build type to compose for
    pub fn request(&self) -> PlatformRequest {
        PlatformRequest::new(self.platform.clone(), self.build_type)
    }

    /// Extra environment for every step. The runner's `LDFLAGS` is carried
    /// in unless `env` sets its own, so linker policy flags extend it.
    pub fn step_env(&self) -> BTreeMap<String, String> {
        self.step_env_with(std::env::var("LDFLAGS").ok())
    }

    fn step_env_with(&self, inherited_ldflags: Option<String>) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        if let Some(ldflags) = inherited_ldflags.filter(|f| !f.trim().is_empty()) {
            env.entry("LDFLAGS".to_string()).or_insert(ldflags);
        }
        env
    }

    /// Per-step timeout, if enabled
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }
}

/// Per-user fallback, e.g. `~/.config/buildgate/config.yaml`
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "buildgate")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}
