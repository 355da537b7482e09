//! Approval workflow engine for deposit and reproduction requests
//!
//! The engine drives a request through its state machine: it validates
//! a submitted decision, applies the aggregation rule for the request's
//! kind, performs an optimistic conditional write, and appends exactly
//! one audit event plus one notification per status transition.
//!
//! # Key Principle
//!
//! **A request cannot silently skip a required approval.** The slot set
//! is fixed at creation, every slot is write-once, concurrent decisions
//! are serialized by the store's conditional write, and every transition
//! is observable after the fact.
//!
//! # Architecture
//!
//! The [`WorkflowEngine`] composes collaborators behind contracts:
//!
//! - [`DecisionAggregator`]: pure next-status computation from slot state
//! - [`RequestStore`]: consistent reads and version-checked writes
//! - [`AuditLog`]: append-only transition record, synchronous with writes
//! - [`NotificationDispatcher`]: best-effort, idempotent delivery contract
//!
//! # Example
//!
//! ```rust
//! use deposit_engine::{MemoryAuditLog, MemoryDispatcher, MemoryRequestStore, WorkflowEngine};
//! use deposit_types::{ActorId, ActorRole, Decision, PartyApprovers, PartyRole, RequestStatus};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = WorkflowEngine::new(
//!     Arc::new(MemoryRequestStore::new()),
//!     Arc::new(MemoryAuditLog::new()),
//!     Arc::new(MemoryDispatcher::new()),
//! );
//!
//! let request = engine
//!     .create_legal_deposit(
//!         ActorId::new("depositor-1"),
//!         PartyApprovers::new(
//!             ActorId::new("editor-1"),
//!             ActorId::new("printer-1"),
//!             ActorId::new("producer-1"),
//!         ),
//!         HashMap::new(),
//!     )
//!     .await
//!     .unwrap();
//!
//! let result = engine
//!     .submit_decision(
//!         &request.id,
//!         ActorRole::Party(PartyRole::Editor),
//!         Decision::Approved,
//!         None,
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.status, RequestStatus::PendingApprovals);
//! assert!(!result.transitioned);
//! # });
//! ```

#![deny(unsafe_code)]

pub mod aggregator;
pub mod audit;
pub mod engine;
pub mod notify;
pub mod store;

// Re-export main types
pub use aggregator::DecisionAggregator;
pub use audit::{AuditLog, MemoryAuditLog};
pub use engine::{EngineConfig, TransitionResult, WorkflowEngine};
pub use notify::{DispatchResult, MemoryDispatcher, NotificationDispatcher};
pub use store::{MemoryRequestStore, RequestStore, VersionToken, WriteOutcome};
