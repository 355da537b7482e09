//! Slots: the kind-specific decision surface of a request
//!
//! `Slots` is what the decision aggregator reads and what a decision
//! submission mutates: the party rows of a legal-deposit request, or
//! the ordered validation stages of a reproduction request. The
//! sequential-stage visibility rule lives here so every reader (the
//! engine, pending-list queries, tests) sees the same answer.

use crate::{
    Decision, Party, PartyApprovers, PartyRole, RequestId, StageName, TransitionCause,
    ValidationStage, WorkflowError, WorkflowResult,
};
use serde::{Deserialize, Serialize};

/// The role a caller acts as when submitting a decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    /// A declared party on a legal-deposit request
    Party(PartyRole),
    /// A validation stage reviewer on a reproduction request
    Stage(StageName),
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Party(role) => write!(f, "party:{}", role),
            Self::Stage(stage) => write!(f, "stage:{}", stage),
        }
    }
}

/// The decision slots of a request, shaped by its kind
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Slots {
    /// Party rows of a legal-deposit request (one per declared role)
    Parties(Vec<Party>),
    /// Ordered validation stages of a reproduction request
    Stages(Vec<ValidationStage>),
}

impl Slots {
    /// Pre-populate the full party set for a legal-deposit request.
    /// All declared roles exist from creation, all pending.
    pub fn legal_deposit(request_id: &RequestId, approvers: &PartyApprovers) -> Self {
        let parties = PartyRole::all()
            .into_iter()
            .map(|role| {
                Party::new(
                    request_id.clone(),
                    role,
                    approvers.for_role(role).clone(),
                )
            })
            .collect();
        Self::Parties(parties)
    }

    /// Pre-populate the two ordered stages for a reproduction request
    pub fn reproduction() -> Self {
        Self::Stages(vec![
            ValidationStage::new(StageName::Service),
            ValidationStage::new(StageName::Manager),
        ])
    }

    pub fn parties(&self) -> Option<&[Party]> {
        match self {
            Self::Parties(parties) => Some(parties),
            Self::Stages(_) => None,
        }
    }

    pub fn stages(&self) -> Option<&[ValidationStage]> {
        match self {
            Self::Stages(stages) => Some(stages),
            Self::Parties(_) => None,
        }
    }

    /// The stage whose decision is currently live, if any.
    ///
    /// Service while it is pending; Manager only once Service resolved
    /// `Approved`. A rejected stage leaves no active stage.
    pub fn active_stage(&self) -> Option<&ValidationStage> {
        let stages = self.stages()?;
        let service = stages.iter().find(|s| s.name == StageName::Service)?;
        match service.decision {
            Decision::Pending => Some(service),
            Decision::Approved => stages
                .iter()
                .find(|s| s.name == StageName::Manager && s.decision.is_pending()),
            Decision::Rejected => None,
        }
    }

    /// Whether the given role has a slot queryable as pending.
    ///
    /// For stages this honors the sequential visibility rule: the
    /// Manager slot does not exist as pending until Service approved.
    pub fn has_pending(&self, role: &ActorRole) -> bool {
        match (self, role) {
            (Self::Parties(parties), ActorRole::Party(party_role)) => parties
                .iter()
                .any(|p| p.role == *party_role && p.decision.is_pending()),
            (Self::Stages(_), ActorRole::Stage(stage_name)) => self
                .active_stage()
                .is_some_and(|s| s.name == *stage_name),
            // Role family does not match the request kind
            _ => false,
        }
    }

    /// Record a decision on the slot the role owns.
    ///
    /// Returns the transition cause to audit. `InvalidActor` when the
    /// role has no pending slot here: wrong kind, unknown role,
    /// already decided, or a stage that is not yet live.
    pub fn record_decision(
        &mut self,
        role: &ActorRole,
        decision: Decision,
        comments: Option<String>,
    ) -> WorkflowResult<TransitionCause> {
        if !self.has_pending(role) {
            return Err(WorkflowError::InvalidActor(format!(
                "role '{}' has no pending slot on this request",
                role
            )));
        }
        match (self, role) {
            (Self::Parties(parties), ActorRole::Party(party_role)) => {
                let party = parties
                    .iter_mut()
                    .find(|p| p.role == *party_role)
                    .ok_or_else(|| {
                        WorkflowError::InvalidActor(format!("no party with role '{}'", party_role))
                    })?;
                party.decide(decision, comments)?;
                Ok(TransitionCause::PartyDecision {
                    role: *party_role,
                    decision,
                })
            }
            (Self::Stages(stages), ActorRole::Stage(stage_name)) => {
                let stage = stages
                    .iter_mut()
                    .find(|s| s.name == *stage_name)
                    .ok_or_else(|| {
                        WorkflowError::InvalidActor(format!("no stage named '{}'", stage_name))
                    })?;
                stage.decide(decision, comments)?;
                Ok(TransitionCause::StageDecision {
                    stage: *stage_name,
                    decision,
                })
            }
            // Unreachable after has_pending, but keep the guard total
            _ => Err(WorkflowError::InvalidActor(format!(
                "role '{}' does not apply to this request kind",
                role
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActorId;

    fn legal_deposit_slots() -> Slots {
        Slots::legal_deposit(
            &RequestId::new("req-1"),
            &PartyApprovers::new(
                ActorId::new("editor-1"),
                ActorId::new("printer-1"),
                ActorId::new("producer-1"),
            ),
        )
    }

    #[test]
    fn test_legal_deposit_prepopulates_all_roles() {
        let slots = legal_deposit_slots();
        let parties = slots.parties().unwrap();
        assert_eq!(parties.len(), 3);
        assert!(parties.iter().all(|p| p.decision.is_pending()));
    }

    #[test]
    fn test_record_party_decision() {
        let mut slots = legal_deposit_slots();
        let cause = slots
            .record_decision(
                &ActorRole::Party(PartyRole::Editor),
                Decision::Approved,
                Some("complete".into()),
            )
            .unwrap();

        assert_eq!(
            cause,
            TransitionCause::PartyDecision {
                role: PartyRole::Editor,
                decision: Decision::Approved,
            }
        );
        assert!(!slots.has_pending(&ActorRole::Party(PartyRole::Editor)));
        assert!(slots.has_pending(&ActorRole::Party(PartyRole::Printer)));
    }

    #[test]
    fn test_second_decision_for_same_role_is_invalid() {
        let mut slots = legal_deposit_slots();
        let role = ActorRole::Party(PartyRole::Printer);
        slots.record_decision(&role, Decision::Approved, None).unwrap();

        let result = slots.record_decision(&role, Decision::Rejected, None);
        assert!(matches!(result, Err(WorkflowError::InvalidActor(_))));
    }

    #[test]
    fn test_party_role_on_reproduction_is_invalid() {
        let mut slots = Slots::reproduction();
        let result = slots.record_decision(
            &ActorRole::Party(PartyRole::Editor),
            Decision::Approved,
            None,
        );
        assert!(matches!(result, Err(WorkflowError::InvalidActor(_))));
    }

    #[test]
    fn test_manager_slot_hidden_until_service_approves() {
        let mut slots = Slots::reproduction();
        let manager = ActorRole::Stage(StageName::Manager);

        // Manager is not queryable as pending yet
        assert!(!slots.has_pending(&manager));
        let premature = slots.record_decision(&manager, Decision::Approved, None);
        assert!(matches!(premature, Err(WorkflowError::InvalidActor(_))));

        // Service approves, so Manager becomes live
        slots
            .record_decision(&ActorRole::Stage(StageName::Service), Decision::Approved, None)
            .unwrap();
        assert!(slots.has_pending(&manager));
        slots.record_decision(&manager, Decision::Approved, None).unwrap();
    }

    #[test]
    fn test_service_rejection_leaves_no_active_stage() {
        let mut slots = Slots::reproduction();
        slots
            .record_decision(&ActorRole::Stage(StageName::Service), Decision::Rejected, None)
            .unwrap();

        assert!(slots.active_stage().is_none());
        assert!(!slots.has_pending(&ActorRole::Stage(StageName::Manager)));
        // Manager slot stays pending for audit clarity, but is not live
        let stages = slots.stages().unwrap();
        assert!(stages
            .iter()
            .find(|s| s.name == StageName::Manager)
            .unwrap()
            .decision
            .is_pending());
    }

    #[test]
    fn test_active_stage_starts_at_service() {
        let slots = Slots::reproduction();
        assert_eq!(slots.active_stage().unwrap().name, StageName::Service);
    }
}
