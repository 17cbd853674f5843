//! End-to-end tests of the buildgate binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A command isolated from the caller's CI environment and user config
#[allow(deprecated)]
fn buildgate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("buildgate").expect("buildgate binary");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("GITHUB_EVENT_PATH")
        .env_remove("BUILDGATE_CONFIG")
        .env_remove("BUILDGATE_PLATFORM")
        .env_remove("LDFLAGS")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace() -> TempDir {
    tempfile::tempdir().expect("tempdir")
}

fn workflow_run_event(name: &str, conclusion: &str) -> String {
    format!(
        r#"{{
  "action": "completed",
  "workflow_run": {{
    "name": "{name}",
    "status": "completed",
    "conclusion": "{conclusion}",
    "head_sha": "3f2a9c1",
    "head_branch": "main"
  }}
}}"#
    )
}

#[test]
fn test_gate_opens_on_upstream_success() {
    let dir = workspace();

    buildgate(&dir)
        .args(["gate", "--outcome", "success"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gate is open"));
}

#[test]
fn test_gate_check_fails_when_closed() {
    let dir = workspace();

    buildgate(&dir)
        .args(["gate", "--outcome", "failure", "--check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Gate is closed"));
}

#[test]
fn test_gate_ignores_other_workflows() {
    let dir = workspace();

    buildgate(&dir)
        .args(["gate", "--outcome", "success", "--workflow", "Lint", "--check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("gate listens to 'Wasm Build'"));
}

#[test]
fn test_gate_reads_event_file() {
    let dir = workspace();
    fs::write(dir.path().join("event.json"), workflow_run_event("Wasm Build", "success")).unwrap();

    let output = buildgate(&dir)
        .args(["gate", "--event", "event.json", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["decision"], "open");
    assert_eq!(report["event"]["head_sha"], "3f2a9c1");
}

#[test]
fn test_gate_without_event_is_closed() {
    let dir = workspace();

    buildgate(&dir)
        .args(["gate", "--check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no upstream event"));
}

#[test]
fn test_plan_json_for_ios() {
    let dir = workspace();

    let output = buildgate(&dir).args(["plan", "--format", "json"]).output().unwrap();

    assert!(output.status.success());
    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["configuration"]["system_name"], "iOS");
    assert_eq!(
        plan["configuration"]["architectures"],
        serde_json::json!(["arm64", "x86_64"])
    );

    let steps: Vec<&str> = plan["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(steps, ["fetch_dependencies", "configure", "build", "install"]);
    assert_eq!(plan["steps"][2]["guarded"], true);
}

#[test]
fn test_plan_unknown_platform_fails() {
    let dir = workspace();

    buildgate(&dir)
        .args(["plan", "--platform", "android"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("android"));
}

#[test]
fn test_run_skips_when_upstream_failed() {
    let dir = workspace();

    buildgate(&dir)
        .args(["run", "--outcome", "failure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Build skipped"));
}

#[test]
fn test_run_dry_run_prints_plan() {
    let dir = workspace();

    buildgate(&dir)
        .args(["run", "--outcome", "success", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gate would open"))
        .stdout(predicate::str::contains("CMAKE_OSX_ARCHITECTURES"));
}

#[test]
fn test_init_writes_config_once() {
    let dir = workspace();

    buildgate(&dir).arg("init").assert().success();
    assert!(dir.path().join(".buildgate.yaml").is_file());

    buildgate(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    buildgate(&dir).args(["init", "--force"]).assert().success();
}

#[test]
fn test_validate_defaults() {
    let dir = workspace();

    buildgate(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid!"));
}

#[test]
fn test_validate_rejects_unknown_platform() {
    let dir = workspace();
    fs::write(dir.path().join(".buildgate.yaml"), "platform: android\n").unwrap();

    buildgate(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Platform 'android' is unknown"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let dir = workspace();

    buildgate(&dir)
        .args(["--config", "missing.yaml", "plan"])
        .assert()
        .failure();
}

#[cfg(unix)]
mod pipeline {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// A project whose fetch script and cmake only log their invocations
    fn fake_project(cmake_body: &str) -> TempDir {
        let dir = workspace();
        let root = dir.path();

        write_script(&root.join("fetch.sh"), "echo fetch >> calls.log\n");
        write_script(
            &root.join("fake-cmake.sh"),
            &format!("echo \"cmake $* LDFLAGS=$LDFLAGS\" >> calls.log\n{cmake_body}"),
        );
        fs::write(
            root.join(".buildgate.yaml"),
            "platform: ios\n\
             step_timeout_secs: 30\n\
             toolchain:\n  \
               fetch_command: ./fetch.sh\n  \
               cmake: ./fake-cmake.sh\n",
        )
        .unwrap();

        dir
    }

    fn calls(dir: &TempDir) -> String {
        fs::read_to_string(dir.path().join("calls.log")).unwrap_or_default()
    }

    #[test]
    fn test_full_pipeline_runs_in_order() {
        let dir = fake_project("exit 0\n");

        buildgate(&dir)
            .args(["run", "--outcome", "success", "--skip-tool-check"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Pipeline completed successfully"));

        let log = calls(&dir);
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 4, "{log}");
        assert_eq!(lines[0], "fetch");
        assert!(lines[1].contains("-DCMAKE_SYSTEM_NAME=iOS"));
        assert!(lines[1].contains("-DCMAKE_OSX_ARCHITECTURES=arm64;x86_64"));
        assert!(lines[1].contains("LDFLAGS=-Wl,-fatal_warnings"));
        assert!(lines[2].contains("--build build"));
        assert!(lines[3].contains("--install build"));
    }

    #[test]
    fn test_runner_ldflags_are_extended() {
        let dir = fake_project("exit 0\n");

        buildgate(&dir)
            .env("LDFLAGS", "-Wl,-dead_strip")
            .args(["run", "--outcome", "success", "--skip-tool-check"])
            .assert()
            .success();

        let log = calls(&dir);
        let configure = log.lines().nth(1).unwrap_or_default();
        assert!(
            configure.contains("LDFLAGS=-Wl,-dead_strip -Wl,-fatal_warnings"),
            "{log}"
        );
    }

    #[test]
    fn test_linker_warning_stops_before_install() {
        let dir = fake_project(
            "if [ \"$1\" = \"--build\" ]; then echo 'ld: warning: object file built for newer iOS version' >&2; fi\nexit 0\n",
        );

        buildgate(&dir)
            .args(["run", "--outcome", "success", "--skip-tool-check"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("linker warnings are fatal"));

        let log = calls(&dir);
        assert!(log.contains("--build build"));
        assert!(!log.contains("--install"), "{log}");
    }

    #[test]
    fn test_configure_failure_short_circuits() {
        let dir = fake_project("if [ \"$1\" = \"-S\" ]; then exit 3; fi\nexit 0\n");

        buildgate(&dir)
            .args(["run", "--outcome", "success", "--skip-tool-check", "--format", "json"])
            .assert()
            .code(3)
            .stdout(predicate::str::contains("\"failed_step\": \"configure\""));

        assert!(!calls(&dir).contains("--build"));
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let dir = fake_project("exit 0\n");
        fs::remove_file(dir.path().join("fetch.sh")).unwrap();

        buildgate(&dir)
            .args(["run", "--outcome", "success"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Missing required tools"));
    }
}
