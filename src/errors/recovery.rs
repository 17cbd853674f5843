// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Error recovery suggestions
//!
//! Actionable next steps printed after a failed run.

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest how to recover from a failure in the named pipeline step
    pub fn for_step(step: &str) -> Self {
        match step {
            "fetch_dependencies" => Self {
                action: "Check the dependency sync script".into(),
                steps: vec![
                    "Third-party sources could not be fetched".into(),
                    "Network access or a moved upstream tag are the usual causes".into(),
                ],
                commands: vec![
                    "# Re-run the sync on its own:".into(),
                    "buildgate plan --format text".into(),
                ],
            },
            "configure" => Self {
                action: "Inspect the CMake configure output".into(),
                steps: vec![
                    "CMake rejected the cross-compile settings".into(),
                    "Verify the Xcode toolchain supports every requested architecture".into(),
                ],
                commands: vec![
                    "# Show the exact configure command:".into(),
                    "buildgate plan".into(),
                ],
            },
            "build" => Self {
                action: "Fix the compile or link errors reported by the build driver".into(),
                steps: vec![
                    "Linker warnings count as errors on platforms with a fatal linker policy".into(),
                ],
                commands: vec![
                    "# Reproduce locally with verbose output:".into(),
                    "buildgate run --verbose".into(),
                ],
            },
            "install" => Self {
                action: "Check the install rules of the project".into(),
                steps: vec![
                    "Build outputs could not be placed in the scratch prefix".into(),
                    "A missing or misnamed install() target is the usual cause".into(),
                ],
                commands: vec![],
            },
            other => Self {
                action: format!("Inspect the output of step '{}'", other),
                steps: vec![],
                commands: vec![],
            },
        }
    }

    /// Suggest installing a missing tool
    pub fn install_tool(tool: &str) -> Self {
        match tool {
            "cmake" => Self {
                action: "Install CMake".into(),
                steps: vec!["CMake drives the configure, build and install steps".into()],
                commands: vec![
                    "# Using Homebrew (macOS):".into(),
                    "brew install cmake ninja".into(),
                ],
            },
            _ => Self {
                action: format!("Install {}", tool),
                steps: vec![format!("Install {} and ensure it's in your PATH", tool)],
                commands: vec![],
            },
        }
    }

    /// Suggest creating a configuration file
    pub fn create_config() -> Self {
        Self {
            action: "Create a buildgate configuration".into(),
            steps: vec![
                "No .buildgate.yaml found; built-in defaults are in use".into(),
                "Write the defaults to disk to customise them".into(),
            ],
            commands: vec!["buildgate init".into()],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
