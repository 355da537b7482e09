//! Notifications: the contract handed to the dispatch collaborator
//!
//! The engine emits exactly one notification per status transition.
//! Delivery is at-least-once and external; the idempotency key, a
//! keyed hash of the request id and the transition sequence number,
//! lets a retried dispatch be deduplicated without the engine caring
//! how delivery happens.

use crate::{ActorId, RequestId, RequestStatus, TransitionEvent};
use serde::{Deserialize, Serialize};

/// User-visible notification categories, mirroring transition causes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Request created and awaiting its first decision
    RequestReceived,
    /// A review stage advanced (reproduction)
    StageAdvanced,
    /// All required approvals collected
    RequestApproved,
    /// A party or stage rejected the request
    RequestRejected,
    /// Validation complete; payment is due
    PaymentRequested,
    /// Payment confirmed and the request fulfilled
    RequestFulfilled,
}

impl NotificationKind {
    /// Derive the notification category from the status a transition
    /// landed on.
    pub fn from_status(to_status: RequestStatus) -> Self {
        match to_status {
            RequestStatus::Approved => Self::RequestApproved,
            RequestStatus::Rejected => Self::RequestRejected,
            RequestStatus::AwaitingPayment => Self::PaymentRequested,
            RequestStatus::Fulfilled => Self::RequestFulfilled,
            RequestStatus::ManagerReview => Self::StageAdvanced,
            RequestStatus::Submitted
            | RequestStatus::PendingApprovals
            | RequestStatus::ServiceReview => Self::RequestReceived,
        }
    }
}

/// A notification for one status transition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    /// The request this notification concerns
    pub request_id: RequestId,
    /// Who the notification is addressed to
    pub recipient: ActorId,
    /// Notification category
    pub kind: NotificationKind,
    /// Human-readable message
    pub message: String,
    /// Deterministic key: retried dispatches of the same transition
    /// must not produce duplicate user-visible notifications.
    pub idempotency_key: String,
}

impl Notification {
    /// Build the notification for a committed transition event
    pub fn for_event(event: &TransitionEvent, recipient: ActorId, message: impl Into<String>) -> Self {
        Self {
            request_id: event.request_id.clone(),
            recipient,
            kind: NotificationKind::from_status(event.to_status),
            message: message.into(),
            idempotency_key: Self::idempotency_key(&event.request_id, event.sequence),
        }
    }

    /// Hash of (request id, transition sequence number), hex-encoded
    pub fn idempotency_key(request_id: &RequestId, sequence: u64) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(request_id.0.as_bytes());
        hasher.update(&sequence.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
