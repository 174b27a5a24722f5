//! Subscription bookkeeping.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};

/// Tracks subscribe intents issued while disconnected and the set of
/// symbols currently subscribed upstream.
///
/// Pending intents are a strict FIFO: they are drained and sent the
/// instant the connection opens, in arrival order, and are never lost
/// while the socket is down.
#[derive(Default)]
pub struct SubscriptionBook {
    pending: Mutex<VecDeque<String>>,
    active: RwLock<HashSet<String>>,
}

impl SubscriptionBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a subscribe intent until the connection opens.
    pub fn buffer(&self, symbol: impl Into<String>) {
        self.pending.lock().push_back(symbol.into());
    }

    /// Take all pending intents, oldest first.
    pub fn drain_pending(&self) -> Vec<String> {
        self.pending.lock().drain(..).collect()
    }

    /// Drop a pending intent that was cancelled before the connection
    /// opened. Removes every queued occurrence of the symbol.
    pub fn cancel_pending(&self, symbol: &str) {
        self.pending.lock().retain(|s| s != symbol);
    }

    /// Number of buffered intents.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Record a subscription delivered upstream.
    pub fn mark_active(&self, symbol: impl Into<String>) {
        self.active.write().insert(symbol.into());
    }

    /// Record an unsubscribe delivered upstream.
    pub fn mark_inactive(&self, symbol: &str) {
        self.active.write().remove(symbol);
    }

    /// Symbols currently subscribed upstream.
    pub fn active_symbols(&self) -> Vec<String> {
        self.active.read().iter().cloned().collect()
    }

    /// Forget all upstream subscriptions (the socket is gone).
    pub fn reset_active(&self) {
        self.active.write().clear();
    }
}
