//! Admission ledger.
//!
//! Records which symbols had a request dispatched "recently" so that
//! un-forced intents for the same symbol can be suppressed before
//! they ever reach the queue. The interesting data (day change,
//! profile, news) does not update faster than the TTL, so a repeat
//! fetch within it is wasted upstream quota.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Symbol → recorded-at marker map with lazy TTL eviction.
///
/// Shared by concurrent enqueue callers and the drain loop; `DashMap`
/// keeps individual operations lock-free from the caller's view.
pub struct AdmissionLedger {
    entries: DashMap<String, DateTime<Utc>>,
    ttl: Duration,
}

impl AdmissionLedger {
    /// Create a ledger whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Record that a request for `symbol` was dispatched now.
    pub fn record(&self, symbol: &str) {
        self.entries.insert(symbol.to_string(), Utc::now());
    }

    /// Check whether a fresh entry exists for `symbol`.
    ///
    /// Expired entries are evicted on lookup.
    pub fn is_fresh(&self, symbol: &str) -> bool {
        let Some(recorded_at) = self.entries.get(symbol).map(|e| *e.value()) else {
            return false;
        };

        let age = (Utc::now() - recorded_at).to_std().unwrap_or(Duration::ZERO);
        if age < self.ttl {
            true
        } else {
            self.entries.remove(symbol);
            false
        }
    }

    /// Number of recorded symbols (expired entries included until
    /// their next lookup).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
