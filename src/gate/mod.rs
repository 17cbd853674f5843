// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Trigger gate
//!
//! Decides whether the downstream build runs. The gate is bound to one
//! upstream workflow and opens only on an explicit success from it; every
//! other case, including a missing event, keeps it closed.

mod event;

pub use event::{UpstreamEvent, UpstreamOutcome};

use serde::Serialize;
use tracing::{debug, info};

/// Name of the upstream workflow the gate listens to by default
pub const DEFAULT_UPSTREAM_WORKFLOW: &str = "Wasm Build";

/// Result of evaluating the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    /// Downstream pipeline should run
    Open,
    /// Downstream pipeline does not run; not a failure
    Skipped { reason: String },
}

impl GateDecision {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Gate bound to a single upstream workflow
#[derive(Debug, Clone)]
pub struct TriggerGate {
    workflow: String,
}

impl TriggerGate {
    /// Create a gate listening to `workflow`
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
        }
    }

    /// Upstream workflow this gate is bound to
    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// True iff the event comes from the bound workflow and reports success
    pub fn should_run(&self, event: &UpstreamEvent) -> bool {
        event.workflow == self.workflow && event.outcome == UpstreamOutcome::Success
    }

    /// Evaluate an optional event, explaining why the gate stayed closed
    pub fn evaluate(&self, event: Option<&UpstreamEvent>) -> GateDecision {
        let decision = match event {
            None => GateDecision::Skipped {
                reason: "no upstream event was provided".into(),
            },
            Some(event) if event.workflow != self.workflow => GateDecision::Skipped {
                reason: format!(
                    "event is from '{}', gate listens to '{}'",
                    event.workflow, self.workflow
                ),
            },
            Some(event) if self.should_run(event) => GateDecision::Open,
            Some(event) => GateDecision::Skipped {
                reason: format!("upstream '{}' outcome is {}", event.workflow, event.outcome),
            },
        };

        match &decision {
            GateDecision::Open => info!(workflow = %self.workflow, "gate open"),
            GateDecision::Skipped { reason } => debug!(workflow = %self.workflow, %reason, "gate closed"),
        }

        decision
    }
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::new(DEFAULT_UPSTREAM_WORKFLOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OUTCOMES: [UpstreamOutcome; 5] = [
        UpstreamOutcome::Success,
        UpstreamOutcome::Failure,
        UpstreamOutcome::Cancelled,
        UpstreamOutcome::InProgress,
        UpstreamOutcome::Inconclusive,
    ];

    #[test]
    fn test_only_success_opens_gate() {
        let gate = TriggerGate::default();

        for outcome in ALL_OUTCOMES {
            let event = UpstreamEvent::new("Wasm Build", outcome);
            assert_eq!(
                gate.should_run(&event),
                outcome == UpstreamOutcome::Success,
                "outcome {outcome}"
            );
        }
    }

    #[test]
    fn test_foreign_workflow_is_ignored() {
        let gate = TriggerGate::default();
        let event = UpstreamEvent::new("Docs Deploy", UpstreamOutcome::Success);

        assert!(!gate.should_run(&event));
        match gate.evaluate(Some(&event)) {
            GateDecision::Skipped { reason } => assert!(reason.contains("Docs Deploy")),
            GateDecision::Open => panic!("gate opened for unrelated workflow"),
        }
    }

    #[test]
    fn test_missing_event_skips() {
        let decision = TriggerGate::default().evaluate(None);
        assert!(!decision.is_open());
    }

    #[test]
    fn test_failure_reason_mentions_outcome() {
        let gate = TriggerGate::new("Wasm Build");
        let event = UpstreamEvent::new("Wasm Build", UpstreamOutcome::Cancelled);

        assert_eq!(
            gate.evaluate(Some(&event)),
            GateDecision::Skipped {
                reason: "upstream 'Wasm Build' outcome is cancelled".into()
            }
        );
    }

    #[test]
    fn test_workflow_match_is_exact() {
        let gate = TriggerGate::new("Wasm Build");
        let event = UpstreamEvent::new("wasm build", UpstreamOutcome::Success);
        assert!(!gate.should_run(&event));
    }
}
