//! Audit log contract and the in-memory reference implementation
//!
//! The audit log is append-only and synchronous with the state
//! transition: the engine does not report success until the append for
//! that transition has stuck. "State changed but unaudited" must be
//! unreachable.

use async_trait::async_trait;
use deposit_types::{RequestId, TransitionEvent, WorkflowResult};
use parking_lot::RwLock;

/// Append-only sink for transition events
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one transition event. Must succeed (possibly after
    /// engine-driven retries) before the transition is reported
    /// successful.
    async fn append(&self, event: TransitionEvent) -> WorkflowResult<()>;
}

/// In-memory audit log for tests and single-process use
pub struct MemoryAuditLog {
    events: RwLock<Vec<TransitionEvent>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// All appended events, in append order
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.read().clone()
    }

    /// Events for one request, in append order
    pub fn events_for(&self, request_id: &RequestId) -> Vec<TransitionEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.request_id == *request_id)
            .cloned()
            .collect()
    }

    /// Number of transitions recorded for a request
    pub fn count_for(&self, request_id: &RequestId) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.request_id == *request_id)
            .count()
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, event: TransitionEvent) -> WorkflowResult<()> {
        self.events.write().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deposit_types::{ActorId, RequestStatus, TransitionCause};

    fn make_event(request: &str, sequence: u64) -> TransitionEvent {
        TransitionEvent::new(
            RequestId::new(request),
            sequence,
            RequestStatus::Submitted,
            RequestStatus::PendingApprovals,
            ActorId::new("depositor-1"),
            TransitionCause::RequestCreated,
        )
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let log = MemoryAuditLog::new();
        log.append(make_event("req-1", 1)).await.unwrap();
        log.append(make_event("req-2", 1)).await.unwrap();
        log.append(make_event("req-1", 2)).await.unwrap();

        let events = log.events_for(&RequestId::new("req-1"));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].sequence, 2);
        assert_eq!(log.count_for(&RequestId::new("req-2")), 1);
    }
}
