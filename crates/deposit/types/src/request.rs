//! Requests: the shared mutable entity the workflow engine drives
//!
//! A Request advances through a directed graph of statuses, gated by
//! decisions recorded on its parties (legal deposit) or validation
//! stages (reproduction). The engine is the only writer of `status`;
//! the kind-specific `metadata` payload is opaque and never inspected
//! for transition logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a request
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a human actor (requester or approver)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Actor used for engine-driven transitions with no human author
    /// (e.g. payment confirmation callbacks).
    pub fn system() -> Self {
        Self("system".to_string())
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Kind and Status ──────────────────────────────────────────────────

/// The two request families; selects the transition table and
/// aggregation rule that applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Legal-deposit submission: unanimity of all declared parties
    LegalDeposit,
    /// Reproduction request: sequential service-then-manager validation
    Reproduction,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LegalDeposit => write!(f, "legal_deposit"),
            Self::Reproduction => write!(f, "reproduction"),
        }
    }
}

/// Status of a request across both state machines.
///
/// Legal deposit: `Submitted → PendingApprovals → Approved | Rejected`.
/// Reproduction: `Submitted → ServiceReview → ManagerReview →
/// AwaitingPayment → Fulfilled`, with `Rejected` reachable from either
/// review stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Initial status; left within the creation operation once the
    /// full slot set exists.
    Submitted,
    /// Collecting party decisions (legal deposit)
    PendingApprovals,
    /// Service desk validation (reproduction)
    ServiceReview,
    /// Department manager validation (reproduction)
    ManagerReview,
    /// Validated; waiting on external payment confirmation
    AwaitingPayment,
    /// All parties approved (terminal)
    Approved,
    /// A party or stage rejected (terminal)
    Rejected,
    /// Payment confirmed and reproduction delivered (terminal)
    Fulfilled,
}

impl RequestStatus {
    /// Whether no further decisions are accepted from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Fulfilled)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::PendingApprovals => "pending_approvals",
            Self::ServiceReview => "service_review",
            Self::ManagerReview => "manager_review",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Fulfilled => "fulfilled",
        };
        write!(f, "{}", s)
    }
}

// ── Request ──────────────────────────────────────────────────────────

/// A request entity with its provenance and opaque payload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    /// Unique request identifier
    pub id: RequestId,
    /// Which transition table applies
    pub kind: RequestKind,
    /// Current status
    pub status: RequestStatus,
    /// Who submitted the request
    pub created_by: ActorId,
    /// When the request was created
    pub created_at: DateTime<Utc>,
    /// When the request was last written
    pub updated_at: DateTime<Utc>,
    /// Kind-specific payload (title, support type, amounts).
    /// Opaque to the engine.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Request {
    /// Create a new request in the initial `Submitted` status
    pub fn new(kind: RequestKind, created_by: ActorId) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::generate(),
            kind,
            status: RequestStatus::Submitted,
            created_by,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
