//! Error types for the approval workflow layer

use crate::{RequestId, RequestStatus};

/// Errors that can occur in workflow operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Request not found: {0}")]
    RequestNotFound(RequestId),

    /// The caller's role has no pending slot on this request, either
    /// the slot was already decided, the role is not a required party,
    /// or the stage is not yet active. Recoverable by the caller
    /// (typically a stale view); never retried by the engine.
    #[error("Invalid actor: {0}")]
    InvalidActor(String),

    /// The request already reached a terminal status. Recoverable by
    /// the caller; never retried.
    #[error("Request {request_id} is already terminal: {status}")]
    AlreadyTerminal {
        request_id: RequestId,
        status: RequestStatus,
    },

    /// The optimistic write lost its race repeatedly. Recoverable by
    /// caller retry against fresh state.
    #[error("Concurrent modification on request {0}: retries exhausted")]
    ConcurrentModification(RequestId),

    /// A state write committed but its audit append could not be made
    /// to stick. The one condition that must never be swallowed,
    /// escalate to operator alerting.
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Request store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
