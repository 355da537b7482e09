//! Domain types for deposit and reproduction approval workflows
//!
//! Two request families share one underlying shape: a request advances
//! through a directed graph of statuses, gated by decisions from one
//! or more independent approvers, with an audit event for every
//! transition.
//!
//! # Key Concepts
//!
//! - **Request**: The entity being approved. Its `kind` selects the
//!   transition table: unanimity of declared parties for legal
//!   deposit, sequential service-then-manager stages for reproduction.
//! - **Party**: An independent human approver on a legal-deposit
//!   request (Editor, Printer, Producer). All required rows exist from
//!   creation; each decision slot is write-once.
//! - **ValidationStage**: A sequential checkpoint of the reproduction
//!   workflow. Only one stage is live at a time.
//! - **Slots**: The kind-specific decision surface handed to the
//!   aggregator and mutated by decision submissions.
//! - **TransitionEvent**: The append-only audit record of one status
//!   change: actor, cause, from/to status, sequence number.
//! - **Notification**: The contract handed to the external dispatcher,
//!   idempotent per (request, transition) key.
//!
//! # Design Principles
//!
//! 1. A request cannot silently skip a required approval: the slot set
//!    is precomputed at creation, never inferred at decision time.
//! 2. Every slot is write-once. Re-deciding requires a fresh request.
//! 3. Every transition is observable after the fact.
//!
//! This is a pure types crate with no runtime dependencies. All types
//! implement `Clone`, `Debug`, `Serialize`, `Deserialize`. IDs use the
//! newtype pattern and implement `Display`, `generate()`, and `new()`.

#![deny(unsafe_code)]

mod errors;
mod event;
mod notification;
mod party;
mod request;
mod slot;
mod stage;

pub use errors::*;
pub use event::*;
pub use notification::*;
pub use party::*;
pub use request::*;
pub use slot::*;
pub use stage::*;
