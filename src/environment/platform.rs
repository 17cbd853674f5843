// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Platform profiles and the build configuration they produce

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Matches warning lines printed by ld64, ld-prime and lld
const LINKER_WARNING_PATTERN: &str =
    r"(?m)^\s*(?:ld|ld64|ld\.lld|ld64\.lld|lld-link): warning: .*$";

/// CMake build type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Debug,
    #[default]
    Release,
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "Debug"),
            Self::Release => write!(f, "Release"),
        }
    }
}

impl std::str::FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            _ => Err(format!("Unknown build type: {}", s)),
        }
    }
}

/// How the linker treats warnings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkerPolicy {
    #[default]
    WarningsAllowed,
    WarningsFatal,
}

impl LinkerPolicy {
    /// Linker flag that escalates warnings, spelled for the target's linker
    pub fn fatal_flag(&self, system_name: &str) -> Option<&'static str> {
        match self {
            Self::WarningsAllowed => None,
            Self::WarningsFatal if is_apple_system(system_name) => Some("-Wl,-fatal_warnings"),
            Self::WarningsFatal => Some("-Wl,--fatal-warnings"),
        }
    }

    /// Output scanner backing the policy, if it needs one
    pub fn warning_guard(&self) -> Option<WarningGuard> {
        match self {
            Self::WarningsAllowed => None,
            Self::WarningsFatal => Some(WarningGuard::linker()),
        }
    }
}

impl std::fmt::Display for LinkerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WarningsAllowed => write!(f, "warnings_allowed"),
            Self::WarningsFatal => write!(f, "warnings_fatal"),
        }
    }
}

fn is_apple_system(system_name: &str) -> bool {
    matches!(
        system_name.to_ascii_lowercase().as_str(),
        "ios" | "darwin" | "tvos" | "watchos" | "visionos"
    )
}

/// Scans step output for lines that a strict policy turns into failures
#[derive(Debug, Clone)]
pub struct WarningGuard {
    pattern: Regex,
}

impl WarningGuard {
    /// Guard that catches linker warnings
    pub fn linker() -> Self {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN
            .get_or_init(|| Regex::new(LINKER_WARNING_PATTERN).expect("Invalid linker warning pattern"))
            .clone();
        Self { pattern }
    }

    /// Offending lines found in `output`, trimmed, in order
    pub fn scan(&self, output: &str) -> Vec<String> {
        self.pattern
            .find_iter(output)
            .map(|m| m.as_str().trim().to_string())
            .collect()
    }
}

/// A named target platform and what building for it requires
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Value for `CMAKE_SYSTEM_NAME`
    pub system_name: String,

    /// Architectures folded into one universal binary, in order
    pub architectures: Vec<String>,

    /// Linker warning policy
    #[serde(default)]
    pub linker_policy: LinkerPolicy,

    /// Minimum OS version (`CMAKE_OSX_DEPLOYMENT_TARGET`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_target: Option<String>,
}

impl PlatformProfile {
    /// Cross-compile for iOS devices and simulators as one universal binary.
    /// The architecture set is fixed so the output never depends on the runner.
    pub fn ios() -> Self {
        Self {
            system_name: "iOS".into(),
            architectures: vec!["arm64".into(), "x86_64".into()],
            linker_policy: LinkerPolicy::WarningsFatal,
            deployment_target: None,
        }
    }

    pub fn macos() -> Self {
        Self {
            system_name: "Darwin".into(),
            architectures: vec!["arm64".into(), "x86_64".into()],
            linker_policy: LinkerPolicy::WarningsAllowed,
            deployment_target: None,
        }
    }
}

/// Everything the pipeline needs to know about the target. Immutable once built.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Platform key the configuration was composed for
    pub platform: String,
    pub system_name: String,
    /// Non-empty, duplicate-free, ordered
    pub architectures: Vec<String>,
    pub build_type: BuildType,
    pub linker_policy: LinkerPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_target: Option<String>,
}

impl BuildConfiguration {
    /// Architecture list in the form `CMAKE_OSX_ARCHITECTURES` expects
    pub fn architecture_descriptor(&self) -> String {
        self.architectures.join(";")
    }

    /// Environment that encodes the linker policy for the toolchain.
    ///
    /// The fatal flag is appended to `ldflags`, the flags already in effect.
    pub fn linker_env(&self, ldflags: Option<&str>) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(flag) = self.linker_policy.fatal_flag(&self.system_name) {
            let value = match ldflags.map(str::trim).filter(|f| !f.is_empty()) {
                Some(existing) if existing.split_whitespace().any(|f| f == flag) => {
                    existing.to_string()
                }
                Some(existing) => format!("{} {}", existing, flag),
                None => flag.to_string(),
            };
            env.insert("LDFLAGS".to_string(), value);
        }
        env
    }

    /// Output scanner for the build step
    pub fn warning_guard(&self) -> Option<WarningGuard> {
        self.linker_policy.warning_guard()
    }
}
