//! Workflow engine: the state machine driver
//!
//! The engine owns the read-decide-write cycle. It validates a
//! submitted decision against the current request state, applies the
//! decision aggregator, performs the conditional write, and on any
//! status change appends exactly one audit event and emits exactly
//! one notification. A lost write race is retried against fresh state
//! up to a bounded number of attempts; no decision is ever silently
//! overwritten.
//!
//! # Key Principle
//!
//! **The engine is the sole writer of request status and decision
//! slots.** Everything around it (storage, audit persistence,
//! notification delivery) is a collaborator behind a contract.

use crate::{
    AuditLog, DecisionAggregator, DispatchResult, NotificationDispatcher, RequestStore,
    WriteOutcome,
};
use deposit_types::{
    ActorId, ActorRole, Decision, Notification, PartyApprovers, Request, RequestId, RequestKind,
    RequestStatus, Slots, TransitionCause, TransitionEvent, WorkflowError, WorkflowResult,
};
use std::collections::HashMap;
use std::sync::Arc;

// ── Configuration ────────────────────────────────────────────────────

/// Retry bounds for the engine's write and audit cycles
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// How many read-decide-write cycles to attempt before surfacing
    /// `ConcurrentModification`
    pub max_write_retries: u32,
    /// How many extra audit appends to attempt before surfacing
    /// `InconsistentState`
    pub max_audit_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_write_retries: 4,
            max_audit_retries: 3,
        }
    }
}

impl EngineConfig {
    pub fn with_max_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = retries;
        self
    }

    pub fn with_max_audit_retries(mut self, retries: u32) -> Self {
        self.max_audit_retries = retries;
        self
    }
}

// ── Results ──────────────────────────────────────────────────────────

/// What a decision submission did to the request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionResult {
    /// The request's status after this call
    pub status: RequestStatus,
    /// Whether this call caused a status transition (vs. merely
    /// recording one decision while others remain pending)
    pub transitioned: bool,
}

// ── Engine ───────────────────────────────────────────────────────────

/// The approval workflow engine
pub struct WorkflowEngine {
    store: Arc<dyn RequestStore>,
    audit: Arc<dyn AuditLog>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    aggregator: DecisionAggregator,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn RequestStore>,
        audit: Arc<dyn AuditLog>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            audit,
            dispatcher,
            aggregator: DecisionAggregator::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    // ── Request creation ─────────────────────────────────────────────

    /// Create a legal-deposit request with its full party set
    /// pre-populated pending. The request leaves `Submitted` within
    /// this operation; the creation transition is audited.
    pub async fn create_legal_deposit(
        &self,
        created_by: ActorId,
        approvers: PartyApprovers,
        metadata: HashMap<String, String>,
    ) -> WorkflowResult<Request> {
        let mut request = Request::new(RequestKind::LegalDeposit, created_by);
        request.metadata = metadata;
        let slots = Slots::legal_deposit(&request.id, &approvers);
        self.create_request(request, slots, RequestStatus::PendingApprovals)
            .await
    }

    /// Create a reproduction request with its two ordered stages.
    /// Service review is live immediately; the Manager slot stays
    /// invisible until Service approves.
    pub async fn create_reproduction(
        &self,
        created_by: ActorId,
        metadata: HashMap<String, String>,
    ) -> WorkflowResult<Request> {
        let mut request = Request::new(RequestKind::Reproduction, created_by);
        request.metadata = metadata;
        let slots = Slots::reproduction();
        self.create_request(request, slots, RequestStatus::ServiceReview)
            .await
    }

    async fn create_request(
        &self,
        mut request: Request,
        slots: Slots,
        initial: RequestStatus,
    ) -> WorkflowResult<Request> {
        let from = request.status;
        request.status = initial;
        self.store.insert(request.clone(), slots).await?;

        let event = TransitionEvent::new(
            request.id.clone(),
            1,
            from,
            initial,
            request.created_by.clone(),
            TransitionCause::RequestCreated,
        );
        self.finalize_transition(&request, event).await?;

        tracing::info!(
            request_id = %request.id,
            kind = %request.kind,
            status = %initial,
            "request created"
        );
        Ok(request)
    }

    // ── Decision submission ──────────────────────────────────────────

    /// Submit a decision for a role on a request.
    ///
    /// Runs the read-decide-write cycle under optimistic concurrency:
    /// a version conflict re-reads fresh state and revalidates, so a
    /// losing writer never overwrites the winner and stale callers get
    /// the truthful `InvalidActor` / `AlreadyTerminal` answer.
    pub async fn submit_decision(
        &self,
        request_id: &RequestId,
        role: ActorRole,
        decision: Decision,
        comments: Option<String>,
    ) -> WorkflowResult<TransitionResult> {
        if decision.is_pending() {
            return Err(WorkflowError::InvalidTransition(
                "a submitted decision must be approved or rejected".into(),
            ));
        }

        for attempt in 0..self.config.max_write_retries {
            let (request, mut slots, version) = self.store.load_with_slots(request_id).await?;
            if request.status.is_terminal() {
                return Err(WorkflowError::AlreadyTerminal {
                    request_id: request_id.clone(),
                    status: request.status,
                });
            }

            let actor = actor_for(&slots, &role);
            let cause = slots.record_decision(&role, decision, comments.clone())?;
            let next = self.aggregator.aggregate(request.kind, request.status, &slots);

            match self
                .store
                .conditional_write(request_id, version, next, slots)
                .await?
            {
                WriteOutcome::Committed {
                    transition_seq,
                    transitioned,
                    ..
                } => {
                    if transitioned {
                        let event = TransitionEvent::new(
                            request_id.clone(),
                            transition_seq,
                            request.status,
                            next,
                            actor,
                            cause,
                        );
                        self.finalize_transition(&request, event).await?;
                        tracing::info!(
                            request_id = %request_id,
                            from = %request.status,
                            to = %next,
                            role = %role,
                            "request transitioned"
                        );
                    } else {
                        tracing::info!(
                            request_id = %request_id,
                            status = %next,
                            role = %role,
                            "decision recorded, other slots still pending"
                        );
                    }
                    return Ok(TransitionResult {
                        status: next,
                        transitioned,
                    });
                }
                WriteOutcome::VersionConflict => {
                    tracing::debug!(
                        request_id = %request_id,
                        attempt,
                        "conditional write lost its race, retrying against fresh state"
                    );
                }
            }
        }

        Err(WorkflowError::ConcurrentModification(request_id.clone()))
    }

    // ── Fulfillment ──────────────────────────────────────────────────

    /// Confirm payment and fulfill a reproduction request. Valid only
    /// from `AwaitingPayment`; same conditional-write and audit
    /// discipline as a decision.
    pub async fn confirm_fulfillment(
        &self,
        request_id: &RequestId,
    ) -> WorkflowResult<TransitionResult> {
        for attempt in 0..self.config.max_write_retries {
            let (request, slots, version) = self.store.load_with_slots(request_id).await?;
            if request.status.is_terminal() {
                return Err(WorkflowError::AlreadyTerminal {
                    request_id: request_id.clone(),
                    status: request.status,
                });
            }
            if request.status != RequestStatus::AwaitingPayment {
                return Err(WorkflowError::InvalidTransition(format!(
                    "fulfillment requires awaiting_payment, request {} is {}",
                    request_id, request.status
                )));
            }

            match self
                .store
                .conditional_write(request_id, version, RequestStatus::Fulfilled, slots)
                .await?
            {
                WriteOutcome::Committed { transition_seq, .. } => {
                    let event = TransitionEvent::new(
                        request_id.clone(),
                        transition_seq,
                        request.status,
                        RequestStatus::Fulfilled,
                        ActorId::system(),
                        TransitionCause::PaymentConfirmed,
                    );
                    self.finalize_transition(&request, event).await?;
                    tracing::info!(request_id = %request_id, "request fulfilled");
                    return Ok(TransitionResult {
                        status: RequestStatus::Fulfilled,
                        transitioned: true,
                    });
                }
                WriteOutcome::VersionConflict => {
                    tracing::debug!(request_id = %request_id, attempt, "fulfillment write conflicted, retrying");
                }
            }
        }

        Err(WorkflowError::ConcurrentModification(request_id.clone()))
    }

    // ── Read-only queries ────────────────────────────────────────────

    /// Current status of a request (eventually consistent for display)
    pub async fn get_status(&self, request_id: &RequestId) -> WorkflowResult<RequestStatus> {
        let (request, _, _) = self.store.load_with_slots(request_id).await?;
        Ok(request.status)
    }

    /// Requests of a kind with a pending slot for the role
    pub async fn list_pending(
        &self,
        role: &ActorRole,
        kind: RequestKind,
    ) -> WorkflowResult<Vec<Request>> {
        self.store.list_pending(role, kind).await
    }

    // ── Transition side effects ──────────────────────────────────────

    /// Append the audit event (with bounded retries), then dispatch
    /// the notification best-effort. Audit failure after retries is
    /// the one non-swallowable condition; dispatch failure is not.
    async fn finalize_transition(
        &self,
        request: &Request,
        event: TransitionEvent,
    ) -> WorkflowResult<()> {
        let notification = Notification::for_event(
            &event,
            request.created_by.clone(),
            message_for(&event),
        );

        self.append_with_retry(event).await?;

        if let DispatchResult::Failed(reason) = self.dispatcher.dispatch(notification).await {
            tracing::warn!(
                request_id = %request.id,
                reason = %reason,
                "notification dispatch failed; transition stands, external queue owns the retry"
            );
        }
        Ok(())
    }

    async fn append_with_retry(&self, event: TransitionEvent) -> WorkflowResult<()> {
        let mut last_error = String::new();
        for attempt in 0..=self.config.max_audit_retries {
            match self.audit.append(event.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::warn!(
                        request_id = %event.request_id,
                        attempt,
                        error = %err,
                        "audit append failed, retrying"
                    );
                    last_error = err.to_string();
                }
            }
        }

        tracing::error!(
            request_id = %event.request_id,
            sequence = event.sequence,
            "audit append exhausted retries: state changed but unaudited"
        );
        Err(WorkflowError::InconsistentState(format!(
            "audit append failed for request {} transition {}: {}",
            event.request_id, event.sequence, last_error
        )))
    }
}

/// Resolve the audit actor for a role: parties carry a declared
/// approver identity; stages are institutional queues recorded by
/// role name.
fn actor_for(slots: &Slots, role: &ActorRole) -> ActorId {
    match (slots, role) {
        (Slots::Parties(parties), ActorRole::Party(party_role)) => parties
            .iter()
            .find(|p| p.role == *party_role)
            .map(|p| p.approver.clone())
            .unwrap_or_else(|| ActorId::new(role.to_string())),
        _ => ActorId::new(role.to_string()),
    }
}

fn message_for(event: &TransitionEvent) -> String {
    match event.to_status {
        RequestStatus::PendingApprovals => {
            format!("Request {} submitted; awaiting party approvals", event.request_id.short())
        }
        RequestStatus::ServiceReview => {
            format!("Request {} submitted; under service review", event.request_id.short())
        }
        RequestStatus::ManagerReview => {
            format!("Request {} passed service review; awaiting manager validation", event.request_id.short())
        }
        RequestStatus::AwaitingPayment => {
            format!("Request {} validated; payment is due", event.request_id.short())
        }
        RequestStatus::Approved => {
            format!("Request {} approved by all parties", event.request_id.short())
        }
        RequestStatus::Rejected => {
            format!("Request {} rejected ({})", event.request_id.short(), event.cause)
        }
        RequestStatus::Fulfilled => {
            format!("Request {} fulfilled", event.request_id.short())
        }
        RequestStatus::Submitted => {
            format!("Request {} submitted", event.request_id.short())
        }
    }
}
