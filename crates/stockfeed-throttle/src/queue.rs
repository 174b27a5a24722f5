//! Ordered, deduplicating request queue.

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use stockfeed_core::{ApiKind, PendingRequest};

/// FIFO buffer of pending fetch intents with in-queue deduplication.
///
/// At most one entry per `(symbol, api_kind)` pair is held at a time;
/// a second push for the same pair while the first is still queued is
/// rejected. Admission order is preserved for dispatch.
///
/// Entries are pushed by many concurrent callers and popped by the
/// single drain loop; one mutex guards both the deque and the dedup
/// index so the two never diverge.
#[derive(Default)]
pub struct RequestQueue {
    inner: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    entries: VecDeque<PendingRequest>,
    queued_keys: HashSet<(String, ApiKind)>,
}

impl RequestQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    ///
    /// Returns `false` when an entry for the same `(symbol, api_kind)`
    /// is already queued.
    pub fn push(&self, request: PendingRequest) -> bool {
        let mut state = self.inner.lock();
        let key = (request.symbol.clone(), request.api_kind);
        if !state.queued_keys.insert(key) {
            return false;
        }
        state.entries.push_back(request);
        true
    }

    /// Pop the oldest entry together with the position of the entry
    /// that was last in the queue at the moment of the pop.
    ///
    /// The tail position is read before removal: when the queue holds
    /// a single entry, the tail is that entry itself and the staleness
    /// distance is zero.
    pub fn pop_with_tail(&self) -> Option<(PendingRequest, i32)> {
        let mut state = self.inner.lock();
        let tail_position = state.entries.back()?.position;
        let request = state.entries.pop_front()?;
        state
            .queued_keys
            .remove(&(request.symbol.clone(), request.api_kind));
        Some((request, tail_position))
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Drop all queued entries.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.entries.clear();
        state.queued_keys.clear();
    }
}
