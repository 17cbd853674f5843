// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Upstream completion events
//!
//! An event is produced outside buildgate and consumed once by the gate.
//! It can be built from CLI flags or parsed from a GitHub `workflow_run`
//! payload.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::BuildgateError;

/// Outcome reported by the upstream workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamOutcome {
    Success,
    Failure,
    Cancelled,
    /// Upstream has not finished yet
    InProgress,
    /// Finished without a pass/fail verdict (skipped, neutral, stale, ...)
    Inconclusive,
}

impl UpstreamOutcome {
    /// Map a CI `conclusion` string to an outcome
    pub fn from_conclusion(conclusion: &str) -> Self {
        match conclusion.to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failure" | "timed_out" | "startup_failure" => Self::Failure,
            "cancelled" => Self::Cancelled,
            _ => Self::Inconclusive,
        }
    }
}

impl std::fmt::Display for UpstreamOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

impl std::str::FromStr for UpstreamOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "cancelled" => Ok(Self::Cancelled),
            "in_progress" | "pending" | "running" => Ok(Self::InProgress),
            "inconclusive" => Ok(Self::Inconclusive),
            _ => Err(format!("Unknown upstream outcome: {}", s)),
        }
    }
}

/// Completion signal from the upstream workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpstreamEvent {
    /// Name of the workflow that produced the event
    pub workflow: String,

    /// How the workflow finished
    pub outcome: UpstreamOutcome,

    /// Commit the upstream run built, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_sha: Option<String>,

    /// Branch the upstream run built, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_branch: Option<String>,
}

impl UpstreamEvent {
    pub fn new(workflow: impl Into<String>, outcome: UpstreamOutcome) -> Self {
        Self {
            workflow: workflow.into(),
            outcome,
            head_sha: None,
            head_branch: None,
        }
    }

    /// Load a webhook payload from disk; `None` if it is not a `workflow_run` event
    pub fn from_file(path: &Path) -> Result<Option<Self>, BuildgateError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BuildgateError::EventReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::from_workflow_run_json(&content)
    }

    /// Parse a GitHub webhook payload.
    ///
    /// Payloads of other event types (push, pull_request, ...) carry no
    /// `workflow_run` object and yield `None`.
    pub fn from_workflow_run_json(json: &str) -> Result<Option<Self>, BuildgateError> {
        let payload: WorkflowRunPayload = serde_json::from_str(json)?;

        let Some(run) = payload.workflow_run else {
            return Ok(None);
        };

        let workflow = run
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| BuildgateError::MalformedEvent {
                reason: "missing 'workflow_run.name'".into(),
            })?;

        let outcome = match (run.status.as_deref(), run.conclusion.as_deref()) {
            (Some("completed"), Some(conclusion)) => UpstreamOutcome::from_conclusion(conclusion),
            (Some("completed"), None) => UpstreamOutcome::Inconclusive,
            (Some(_), _) => UpstreamOutcome::InProgress,
            (None, Some(conclusion)) => UpstreamOutcome::from_conclusion(conclusion),
            (None, None) => {
                return Err(BuildgateError::MalformedEvent {
                    reason: "neither 'status' nor 'conclusion' is present".into(),
                })
            }
        };

        Ok(Some(Self {
            workflow,
            outcome,
            head_sha: run.head_sha,
            head_branch: run.head_branch,
        }))
    }
}

/// The subset of the webhook payload buildgate reads
#[derive(Debug, Deserialize)]
struct WorkflowRunPayload {
    #[serde(default)]
    workflow_run: Option<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRun {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    conclusion: Option<String>,
    #[serde(default)]
    head_sha: Option<String>,
    #[serde(default)]
    head_branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completed_success_payload() {
        let json = r#"{
            "action": "completed",
            "workflow_run": {
                "name": "Wasm Build",
                "status": "completed",
                "conclusion": "success",
                "head_sha": "3f2a9c1",
                "head_branch": "main"
            }
        }"#;

        let event = UpstreamEvent::from_workflow_run_json(json).unwrap().unwrap();
        assert_eq!(event.workflow, "Wasm Build");
        assert_eq!(event.outcome, UpstreamOutcome::Success);
        assert_eq!(event.head_sha.as_deref(), Some("3f2a9c1"));
        assert_eq!(event.head_branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_running_upstream_is_in_progress() {
        let json = r#"{"workflow_run": {"name": "Wasm Build", "status": "in_progress", "conclusion": null}}"#;
        let event = UpstreamEvent::from_workflow_run_json(json).unwrap().unwrap();
        assert_eq!(event.outcome, UpstreamOutcome::InProgress);
    }

    #[test]
    fn test_conclusion_mapping() {
        assert_eq!(UpstreamOutcome::from_conclusion("timed_out"), UpstreamOutcome::Failure);
        assert_eq!(UpstreamOutcome::from_conclusion("cancelled"), UpstreamOutcome::Cancelled);
        assert_eq!(UpstreamOutcome::from_conclusion("skipped"), UpstreamOutcome::Inconclusive);
        assert_eq!(UpstreamOutcome::from_conclusion("SUCCESS"), UpstreamOutcome::Success);
    }

    #[test]
    fn test_other_event_types_carry_no_upstream_event() {
        let push = r#"{"ref": "refs/heads/main", "after": "3f2a9c1"}"#;
        assert!(UpstreamEvent::from_workflow_run_json(push).unwrap().is_none());
    }

    #[test]
    fn test_unnamed_workflow_run_is_malformed() {
        let json = r#"{"workflow_run": {"status": "completed", "conclusion": "success"}}"#;
        let err = UpstreamEvent::from_workflow_run_json(json).unwrap_err();
        assert!(matches!(err, BuildgateError::MalformedEvent { .. }));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = UpstreamEvent::from_workflow_run_json("not json").unwrap_err();
        assert!(matches!(err, BuildgateError::Json { .. }));
    }

    #[test]
    fn test_outcome_from_str() {
        assert_eq!("pending".parse::<UpstreamOutcome>().unwrap(), UpstreamOutcome::InProgress);
        assert!("exploded".parse::<UpstreamOutcome>().is_err());
    }
}
