//! Request store contract and the in-memory reference implementation
//!
//! The store is an external collaborator: the engine only requires a
//! consistent read of a request with its slots, a conditional write
//! keyed on the observed version, and the pending-list query. The
//! in-memory store implements the same contract for tests and
//! single-process deployments.

use async_trait::async_trait;
use chrono::Utc;
use deposit_types::{
    ActorRole, Request, RequestId, RequestKind, RequestStatus, Slots, WorkflowError,
    WorkflowResult,
};
use parking_lot::RwLock;
use std::collections::HashMap;

// ── Versioning ───────────────────────────────────────────────────────

/// Monotonic version observed at load time and compared at write time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionToken(pub u64);

/// Outcome of a conditional write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write landed; carries the new version and the request's
    /// transition sequence number after the write (incremented only
    /// when the status actually changed).
    Committed {
        version: VersionToken,
        transition_seq: u64,
        transitioned: bool,
    },
    /// Another writer got there first; re-read and retry
    VersionConflict,
}

// ── Contract ─────────────────────────────────────────────────────────

/// Durable storage for requests and their decision slots.
///
/// Two decisions on the same request are serialized by the conditional
/// write: the store compares the caller's observed version against the
/// stored one and rejects stale writers, so no decision is ever lost.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a freshly created request with its pre-populated slots.
    /// The request arrives already on its initial working status.
    async fn insert(&self, request: Request, slots: Slots) -> WorkflowResult<VersionToken>;

    /// Load a request with its slots in a single consistent read
    async fn load_with_slots(
        &self,
        id: &RequestId,
    ) -> WorkflowResult<(Request, Slots, VersionToken)>;

    /// Write the new status and updated slot set, only if the stored
    /// version still equals `expected`.
    async fn conditional_write(
        &self,
        id: &RequestId,
        expected: VersionToken,
        new_status: RequestStatus,
        slots: Slots,
    ) -> WorkflowResult<WriteOutcome>;

    /// Requests of the given kind with a slot queryable as pending for
    /// the role. Eventually consistent; honors the sequential-stage
    /// visibility rule.
    async fn list_pending(
        &self,
        role: &ActorRole,
        kind: RequestKind,
    ) -> WorkflowResult<Vec<Request>>;
}

// ── In-memory implementation ─────────────────────────────────────────

#[derive(Clone, Debug)]
struct StoredRequest {
    request: Request,
    slots: Slots,
    version: VersionToken,
    transition_seq: u64,
}

/// In-memory request store for tests and single-process use
pub struct MemoryRequestStore {
    records: RwLock<HashMap<RequestId, StoredRequest>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored requests
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for MemoryRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn insert(&self, request: Request, slots: Slots) -> WorkflowResult<VersionToken> {
        let mut records = self.records.write();
        let version = VersionToken(1);
        records.insert(
            request.id.clone(),
            StoredRequest {
                request,
                slots,
                version,
                // Creation itself is the first transition (Submitted
                // left behind within the create operation).
                transition_seq: 1,
            },
        );
        Ok(version)
    }

    async fn load_with_slots(
        &self,
        id: &RequestId,
    ) -> WorkflowResult<(Request, Slots, VersionToken)> {
        let records = self.records.read();
        let stored = records
            .get(id)
            .ok_or_else(|| WorkflowError::RequestNotFound(id.clone()))?;
        Ok((stored.request.clone(), stored.slots.clone(), stored.version))
    }

    async fn conditional_write(
        &self,
        id: &RequestId,
        expected: VersionToken,
        new_status: RequestStatus,
        slots: Slots,
    ) -> WorkflowResult<WriteOutcome> {
        let mut records = self.records.write();
        let stored = records
            .get_mut(id)
            .ok_or_else(|| WorkflowError::RequestNotFound(id.clone()))?;

        if stored.version != expected {
            return Ok(WriteOutcome::VersionConflict);
        }

        let transitioned = stored.request.status != new_status;
        stored.request.status = new_status;
        stored.request.updated_at = Utc::now();
        stored.slots = slots;
        stored.version = VersionToken(stored.version.0 + 1);
        if transitioned {
            stored.transition_seq += 1;
        }

        Ok(WriteOutcome::Committed {
            version: stored.version,
            transition_seq: stored.transition_seq,
            transitioned,
        })
    }

    async fn list_pending(
        &self,
        role: &ActorRole,
        kind: RequestKind,
    ) -> WorkflowResult<Vec<Request>> {
        let records = self.records.read();
        let mut pending: Vec<Request> = records
            .values()
            .filter(|s| s.request.kind == kind && !s.request.is_terminal())
            .filter(|s| s.slots.has_pending(role))
            .map(|s| s.request.clone())
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }
}
