// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Pipeline step definitions
//!
//! A plan is always the same four steps in the same order. What varies is
//! the command line and environment each step gets, which come from the
//! build configuration and toolchain settings.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ToolchainConfig;
use crate::environment::{BuildConfiguration, WarningGuard};

/// The four pipeline steps
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    FetchDependencies,
    Configure,
    Build,
    Install,
}

impl StepName {
    /// Steps in execution order
    pub const ALL: [StepName; 4] = [
        StepName::FetchDependencies,
        StepName::Configure,
        StepName::Build,
        StepName::Install,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchDependencies => "fetch_dependencies",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external invocation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// Shell-style rendering, for display only
impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, quote(value))?;
        }
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// One step of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineStep {
    pub name: StepName,
    pub command: CommandSpec,
    /// Output lines that fail the step even when it exits 0
    pub warning_guard: Option<WarningGuard>,
}

/// The ordered steps for one run
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub steps: Vec<PipelineStep>,
}

impl PipelinePlan {
    /// Plan fetch → configure → build → install for `configuration`.
    ///
    /// `extra_env` is applied to every step; the linker policy environment
    /// is layered on top for configure and build.
    pub fn for_configuration(
        configuration: &BuildConfiguration,
        toolchain: &ToolchainConfig,
        extra_env: &BTreeMap<String, String>,
    ) -> Self {
        let mut build_env = extra_env.clone();
        build_env.extend(configuration.linker_env(extra_env.get("LDFLAGS").map(String::as_str)));

        let build_dir = path_arg(&toolchain.build_dir);

        let fetch = CommandSpec::new(&toolchain.fetch_command).envs(extra_env);

        let mut configure = CommandSpec::new(&toolchain.cmake)
            .arg("-S")
            .arg(path_arg(&toolchain.source_dir))
            .arg("-B")
            .arg(&build_dir)
            .arg("-G")
            .arg(&toolchain.generator)
            .arg(format!("-DCMAKE_SYSTEM_NAME={}", configuration.system_name))
            .arg(format!("-DCMAKE_BUILD_TYPE={}", configuration.build_type))
            .arg(format!(
                "-DCMAKE_OSX_ARCHITECTURES={}",
                configuration.architecture_descriptor()
            ));
        if let Some(ref target) = configuration.deployment_target {
            configure = configure.arg(format!("-DCMAKE_OSX_DEPLOYMENT_TARGET={}", target));
        }
        let configure = configure.envs(&build_env);

        let build = CommandSpec::new(&toolchain.cmake)
            .arg("--build")
            .arg(&build_dir)
            .arg("--config")
            .arg(configuration.build_type.to_string())
            .envs(&build_env);

        let install = CommandSpec::new(&toolchain.cmake)
            .arg("--install")
            .arg(&build_dir)
            .arg("--config")
            .arg(configuration.build_type.to_string())
            .arg("--prefix")
            .arg(path_arg(&toolchain.install_prefix))
            .envs(extra_env);

        Self {
            steps: vec![
                PipelineStep {
                    name: StepName::FetchDependencies,
                    command: fetch,
                    warning_guard: None,
                },
                PipelineStep {
                    name: StepName::Configure,
                    command: configure,
                    warning_guard: None,
                },
                PipelineStep {
                    name: StepName::Build,
                    command: build,
                    warning_guard: configuration.warning_guard(),
                },
                PipelineStep {
                    name: StepName::Install,
                    command: install,
                    warning_guard: None,
                },
            ],
        }
    }

    /// Get a step by name
    pub fn step(&self, name: StepName) -> Option<&PipelineStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Distinct programs the plan needs, in first-use order
    pub fn programs(&self) -> Vec<&str> {
        let mut programs: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !programs.contains(&step.command.program.as_str()) {
                programs.push(&step.command.program);
            }
        }
        programs
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{BuildType, EnvironmentComposer, PlatformRequest};

    fn ios_plan(extra_env: BTreeMap<String, String>) -> PipelinePlan {
        let configuration = EnvironmentComposer::new()
            .compose(&PlatformRequest::new("ios", BuildType::Release))
            .unwrap();
        PipelinePlan::for_configuration(&configuration, &ToolchainConfig::default(), &extra_env)
    }

    #[test]
    fn test_plan_has_four_steps_in_order() {
        let plan = ios_plan(BTreeMap::new());
        let names: Vec<_> = plan.steps.iter().map(|s| s.name).collect();
        assert_eq!(names, StepName::ALL);
    }

    #[test]
    fn test_fetch_takes_no_arguments() {
        let plan = ios_plan(BTreeMap::new());
        let fetch = plan.step(StepName::FetchDependencies).unwrap();
        assert_eq!(fetch.command.program, "./scripts/fetch-dependencies");
        assert!(fetch.command.args.is_empty());
    }

    #[test]
    fn test_configure_carries_architectures_and_linker_policy() {
        let plan = ios_plan(BTreeMap::new());
        let configure = plan.step(StepName::Configure).unwrap();

        assert!(configure
            .command
            .args
            .contains(&"-DCMAKE_OSX_ARCHITECTURES=arm64;x86_64".to_string()));
        assert!(configure.command.args.contains(&"-DCMAKE_SYSTEM_NAME=iOS".to_string()));
        assert!(configure.command.args.contains(&"-DCMAKE_BUILD_TYPE=Release".to_string()));
        assert_eq!(configure.command.env["LDFLAGS"], "-Wl,-fatal_warnings");
    }

    #[test]
    fn test_only_build_step_is_guarded() {
        let plan = ios_plan(BTreeMap::new());
        for step in &plan.steps {
            assert_eq!(step.warning_guard.is_some(), step.name == StepName::Build);
        }
    }

    #[test]
    fn test_relaxed_platform_has_no_guard_or_flag() {
        let configuration = EnvironmentComposer::new()
            .compose(&PlatformRequest::new("macos", BuildType::Debug))
            .unwrap();
        let plan = PipelinePlan::for_configuration(
            &configuration,
            &ToolchainConfig::default(),
            &BTreeMap::new(),
        );

        assert!(plan.steps.iter().all(|s| s.warning_guard.is_none()));
        assert!(plan.steps.iter().all(|s| !s.command.env.contains_key("LDFLAGS")));
    }

    #[test]
    fn test_linker_policy_extends_user_ldflags() {
        let env = BTreeMap::from([
            ("LDFLAGS".to_string(), "-Wl,-dead_strip".to_string()),
            ("CCACHE_DIR".to_string(), "/tmp/ccache".to_string()),
        ]);
        let plan = ios_plan(env);

        let build = plan.step(StepName::Build).unwrap();
        assert_eq!(build.command.env["LDFLAGS"], "-Wl,-dead_strip -Wl,-fatal_warnings");
        assert_eq!(build.command.env["CCACHE_DIR"], "/tmp/ccache");

        let configure = plan.step(StepName::Configure).unwrap();
        assert_eq!(configure.command.env["LDFLAGS"], "-Wl,-dead_strip -Wl,-fatal_warnings");

        let install = plan.step(StepName::Install).unwrap();
        assert_eq!(install.command.env["LDFLAGS"], "-Wl,-dead_strip");
    }

    #[test]
    fn test_install_targets_scratch_prefix() {
        let plan = ios_plan(BTreeMap::new());
        let install = plan.step(StepName::Install).unwrap();
        assert_eq!(
            install.command.args,
            vec!["--install", "build", "--config", "Release", "--prefix", ".buildgate/install"]
        );
    }

    #[test]
    fn test_display_quotes_special_arguments() {
        let command = CommandSpec::new("cmake")
            .arg("-DCMAKE_OSX_ARCHITECTURES=arm64;x86_64")
            .arg("it's");
        assert_eq!(
            command.to_string(),
            r"cmake '-DCMAKE_OSX_ARCHITECTURES=arm64;x86_64' 'it'\''s'"
        );
    }

    #[test]
    fn test_programs_are_deduplicated() {
        let plan = ios_plan(BTreeMap::new());
        assert_eq!(plan.programs(), vec!["./scripts/fetch-dependencies", "cmake"]);
    }
}
