//! Transition events: the audit record of every status change
//!
//! One event is appended per status transition, not per decision
//! submission, which may exceed transitions when a decision leaves the
//! request in the same status. Events carry a per-request sequence
//! number, assigned by the store at commit time, that orders the
//! request's history and seeds notification idempotency keys.

use crate::{ActorId, Decision, PartyRole, RequestId, RequestStatus, StageName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an audit event
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEventId(pub String);

impl AuditEventId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AuditEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What triggered a transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// The request was created with its full slot set
    RequestCreated,
    /// A party decision on a legal-deposit request
    PartyDecision { role: PartyRole, decision: Decision },
    /// A stage decision on a reproduction request
    StageDecision { stage: StageName, decision: Decision },
    /// External payment confirmation
    PaymentConfirmed,
}

impl std::fmt::Display for TransitionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestCreated => write!(f, "request_created"),
            Self::PartyDecision { role, decision } => {
                write!(f, "party_decision:{}:{}", role, decision)
            }
            Self::StageDecision { stage, decision } => {
                write!(f, "stage_decision:{}:{}", stage, decision)
            }
            Self::PaymentConfirmed => write!(f, "payment_confirmed"),
        }
    }
}

/// The append-only record of one status transition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Unique event identifier
    pub event_id: AuditEventId,
    /// The request that transitioned
    pub request_id: RequestId,
    /// Per-request transition sequence number (1 = creation)
    pub sequence: u64,
    /// Status observed before the transition
    pub from_status: RequestStatus,
    /// Status after the transition
    pub to_status: RequestStatus,
    /// Who caused the transition
    pub actor: ActorId,
    /// When the transition was committed
    pub occurred_at: DateTime<Utc>,
    /// Which decision (or external event) triggered it
    pub cause: TransitionCause,
}

impl TransitionEvent {
    pub fn new(
        request_id: RequestId,
        sequence: u64,
        from_status: RequestStatus,
        to_status: RequestStatus,
        actor: ActorId,
        cause: TransitionCause,
    ) -> Self {
        Self {
            event_id: AuditEventId::generate(),
            request_id,
            sequence,
            from_status,
            to_status,
            actor,
            occurred_at: Utc::now(),
            cause,
        }
    }
}
