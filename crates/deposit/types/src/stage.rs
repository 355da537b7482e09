//! Validation stages: the sequential checkpoints of a reproduction request
//!
//! A reproduction request carries exactly two stages, ordered Service
//! then Manager. Only one stage is live at a time: the Manager slot is
//! not queryable as pending until the Service stage has resolved
//! `Approved`.

use crate::{Decision, WorkflowError, WorkflowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The ordered checkpoints of the reproduction workflow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    /// Service desk validation (first)
    Service,
    /// Department manager validation (second)
    Manager,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Manager => write!(f, "manager"),
        }
    }
}

/// One sequential approval checkpoint with a single decision slot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationStage {
    /// Which checkpoint this is
    pub name: StageName,
    /// Current decision slot (same write-once rule as a party)
    pub decision: Decision,
    /// When the decision left `Pending`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Reviewer comments recorded with the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl ValidationStage {
    /// Create a pending stage
    pub fn new(name: StageName) -> Self {
        Self {
            name,
            decision: Decision::Pending,
            decided_at: None,
            comments: None,
        }
    }

    /// Record this stage's decision. Write-once.
    pub fn decide(&mut self, decision: Decision, comments: Option<String>) -> WorkflowResult<()> {
        if !self.decision.is_pending() {
            return Err(WorkflowError::InvalidActor(format!(
                "stage '{}' already decided: {}",
                self.name, self.decision
            )));
        }
        if decision.is_pending() {
            return Err(WorkflowError::InvalidTransition(
                "a decision must be approved or rejected".into(),
            ));
        }
        self.decision = decision;
        self.decided_at = Some(Utc::now());
        self.comments = comments;
        Ok(())
    }
}
