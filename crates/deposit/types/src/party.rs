//! Parties: the independent approvers of a legal-deposit request
//!
//! Every legal-deposit request carries its full set of required
//! parties from creation. A party's decision is write-once per
//! request lifecycle: re-deciding requires a fresh request, never a
//! silent overwrite.

use crate::{ActorId, RequestId, WorkflowError, WorkflowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Decisions ────────────────────────────────────────────────────────

/// A decision slot's value. Slots start `Pending` and leave it
/// exactly once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Decision {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

// ── Roles ────────────────────────────────────────────────────────────

/// The closed set of declared party roles on a legal-deposit request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyRole {
    Editor,
    Printer,
    Producer,
}

impl PartyRole {
    /// All required roles, in declaration order
    pub fn all() -> [PartyRole; 3] {
        [Self::Editor, Self::Printer, Self::Producer]
    }
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Editor => "editor",
            Self::Printer => "printer",
            Self::Producer => "producer",
        };
        write!(f, "{}", s)
    }
}

/// Unique identifier for a party row
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyId(pub String);

impl PartyId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Party ────────────────────────────────────────────────────────────

/// One required approver of a legal-deposit request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Party {
    /// Unique party row identifier
    pub id: PartyId,
    /// The request this party must sign off on
    pub request_id: RequestId,
    /// The declared role this party fills
    pub role: PartyRole,
    /// Identity of the human approver
    pub approver: ActorId,
    /// Current decision slot
    pub decision: Decision,
    /// When the decision left `Pending` (set exactly once)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Approver comments recorded with the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Party {
    /// Create a pending party row for a request
    pub fn new(request_id: RequestId, role: PartyRole, approver: ActorId) -> Self {
        Self {
            id: PartyId::generate(),
            request_id,
            role,
            approver,
            decision: Decision::Pending,
            decided_at: None,
            comments: None,
        }
    }

    /// Record this party's decision. Write-once: a slot that already
    /// left `Pending` rejects the call.
    pub fn decide(&mut self, decision: Decision, comments: Option<String>) -> WorkflowResult<()> {
        if !self.decision.is_pending() {
            return Err(WorkflowError::InvalidActor(format!(
                "party '{}' on request {} already decided: {}",
                self.role, self.request_id, self.decision
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

/// The approver identity declared for each required role at
/// request-creation time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartyApprovers {
    pub editor: ActorId,
    pub printer: ActorId,
    pub producer: ActorId,
}

impl PartyApprovers {
    pub fn new(editor: ActorId, printer: ActorId, producer: ActorId) -> Self {
        Self {
            editor,
            printer,
            producer,
        }
    }

    /// The approver declared for a role
    pub fn for_role(&self, role: PartyRole) -> &ActorId {
        match role {
            PartyRole::Editor => &self.editor,
            PartyRole::Printer => &self.printer,
            PartyRole::Producer => &self.producer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_party() -> Party {
        Party::new(
            RequestId::new("req-1"),
            PartyRole::Editor,
            ActorId::new("editor-1"),
        )
    }

    #[test]
    fn test_new_party_is_pending() {
        let party = make_party();
        assert!(party.decision.is_pending());
        assert!(party.decided_at.is_none());
        assert!(party.comments.is_none());
    }

    #[test]
    fn test_decide_sets_slot_once() {
        let mut party = make_party();
        party
            .decide(Decision::Approved, Some("looks complete".into()))
            .unwrap();

        assert_eq!(party.decision, Decision::Approved);
        assert!(party.decided_at.is_some());
        assert_eq!(party.comments.as_deref(), Some("looks complete"));
    }

    #[test]
    fn test_decide_twice_is_rejected() {
        let mut party = make_party();
        party.decide(Decision::Approved, None).unwrap();

        let result = party.decide(Decision::Rejected, None);
        assert!(matches!(result, Err(WorkflowError::InvalidActor(_))));
        // Original decision untouched
        assert_eq!(party.decision, Decision::Approved);
    }

    #[test]
    fn test_decide_pending_is_invalid() {
        let mut party = make_party();
        let result = party.decide(Decision::Pending, None);
        assert!(matches!(result, Err(WorkflowError::InvalidTransition(_))));
        assert!(party.decision.is_pending());
    }

    #[test]
    fn test_approvers_for_role() {
        let approvers = PartyApprovers::new(
            ActorId::new("e"),
            ActorId::new("p"),
            ActorId::new("pr"),
        );
        assert_eq!(approvers.for_role(PartyRole::Printer), &ActorId::new("p"));
    }
}
