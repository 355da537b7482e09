//! Notification dispatch contract
//!
//! Dispatch is best-effort and decoupled from the transition write: a
//! failed dispatch never rolls back a committed transition. Delivery
//! is at-least-once on the collaborator's side; the idempotency key the
//! engine supplies lets a retried dispatch be deduplicated.

use async_trait::async_trait;
use deposit_types::Notification;
use parking_lot::RwLock;
use std::collections::HashSet;

/// Outcome of one dispatch attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchResult {
    /// Accepted for delivery
    Delivered,
    /// Same idempotency key was already accepted and this one was dropped
    Duplicate,
    /// Dispatch failed; the external system owns the retry queue
    Failed(String),
}

/// The interface the engine calls to notify affected parties
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: Notification) -> DispatchResult;
}

/// In-memory dispatcher with idempotency-key deduplication
pub struct MemoryDispatcher {
    delivered: RwLock<Vec<Notification>>,
    seen_keys: RwLock<HashSet<String>>,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self {
            delivered: RwLock::new(Vec::new()),
            seen_keys: RwLock::new(HashSet::new()),
        }
    }

    /// Notifications accepted so far, in dispatch order
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.read().clone()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.read().len()
    }
}

impl Default for MemoryDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDispatcher for MemoryDispatcher {
    async fn dispatch(&self, notification: Notification) -> DispatchResult {
        let mut seen = self.seen_keys.write();
        if !seen.insert(notification.idempotency_key.clone()) {
            return DispatchResult::Duplicate;
        }
        self.delivered.write().push(notification);
        DispatchResult::Delivered
    }
}
