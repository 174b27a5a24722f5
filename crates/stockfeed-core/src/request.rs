//! Fetch intents and admission-queue entries.

use crate::types::{ApiKind, Symbol};

/// A fetch intent submitted to the throttler.
///
/// Carries the two admission flags alongside the request itself.
/// `position` is the UI list position active when the request was
/// issued; the drain loop compares it against the newest queued
/// position to decide whether the entry is still worth dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchIntent {
    /// Ticker symbol the request is about.
    pub symbol: Symbol,
    /// Which handler to invoke.
    pub api_kind: ApiKind,
    /// UI position active when the request was issued.
    pub position: i32,
    /// Allow the entry to be silently discarded when the UI has
    /// scrolled far away by the time it is drained.
    pub drop_if_stale: bool,
    /// Bypass the admission ledger (force a re-fetch).
    pub ignore_duplicate: bool,
}

impl FetchIntent {
    /// Create an intent with the default flags: position 0,
    /// staleness dropping enabled, ledger consulted.
    pub fn new(symbol: impl Into<Symbol>, api_kind: ApiKind) -> Self {
        Self {
            symbol: symbol.into(),
            api_kind,
            position: 0,
            drop_if_stale: true,
            ignore_duplicate: false,
        }
    }

    /// Set the originating UI position.
    #[must_use]
    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Keep the entry even when the UI has moved on.
    #[must_use]
    pub fn keep_if_stale(mut self) -> Self {
        self.drop_if_stale = false;
        self
    }

    /// Bypass the admission ledger.
    #[must_use]
    pub fn force(mut self) -> Self {
        self.ignore_duplicate = true;
        self
    }
}

/// One admission-queue entry.
///
/// The queued form of a [`FetchIntent`]; the `ignore_duplicate` flag
/// is consumed at admission and never travels with the entry. Owned
/// exclusively by the queue until dequeued, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub symbol: Symbol,
    pub api_kind: ApiKind,
    pub position: i32,
    pub drop_if_stale: bool,
}

impl From<FetchIntent> for PendingRequest {
    fn from(intent: FetchIntent) -> Self {
        Self {
            symbol: intent.symbol,
            api_kind: intent.api_kind,
            position: intent.position,
            drop_if_stale: intent.drop_if_stale,
        }
    }
}

/// Outcome of an enqueue attempt.
///
/// Suppression is a deliberate no-op, not an error: the ledger already
/// holds a fresh outcome for the symbol and the local cache should be
/// used instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The intent was appended to the request queue.
    Accepted,
    /// The intent was dropped because a fresh ledger entry exists.
    Suppressed,
}

impl Admission {
    /// Check whether the intent was queued.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
