//! Throttler configuration.

use crate::error::{ThrottleError, ThrottleResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Throttler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Pause between processed queue entries (ms). This is the
    /// per-second upstream rate limit; it is consumed once per
    /// processed item whether the item was dispatched or discarded.
    /// Default: 1000.
    #[serde(default = "default_dispatch_interval_ms")]
    pub dispatch_interval_ms: u64,
    /// Poll interval while the queue is empty (ms). Default: 200.
    #[serde(default = "default_idle_poll_interval_ms")]
    pub idle_poll_interval_ms: u64,
    /// Distance between an entry's position and the newest queued
    /// position at which the entry counts as stale. Default: 15.
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold: u32,
    /// How long a ledger entry suppresses re-fetching (seconds).
    /// Default: 86,400 (one day; data like "price change for the day"
    /// does not update earlier than the next day).
    #[serde(default = "default_ledger_ttl_secs")]
    pub ledger_ttl_secs: u64,
}

fn default_dispatch_interval_ms() -> u64 {
    1_000
}

fn default_idle_poll_interval_ms() -> u64 {
    200
}

fn default_staleness_threshold() -> u32 {
    15
}

fn default_ledger_ttl_secs() -> u64 {
    86_400
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            dispatch_interval_ms: default_dispatch_interval_ms(),
            idle_poll_interval_ms: default_idle_poll_interval_ms(),
            staleness_threshold: default_staleness_threshold(),
            ledger_ttl_secs: default_ledger_ttl_secs(),
        }
    }
}

impl ThrottleConfig {
    /// Validate interval settings.
    pub fn validate(&self) -> ThrottleResult<()> {
        if self.dispatch_interval_ms == 0 {
            return Err(ThrottleError::InvalidConfig(
                "dispatch_interval_ms must be > 0".to_string(),
            ));
        }
        if self.idle_poll_interval_ms == 0 {
            return Err(ThrottleError::InvalidConfig(
                "idle_poll_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Pause between processed entries.
    #[must_use]
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    /// Poll interval while idle.
    #[must_use]
    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.idle_poll_interval_ms)
    }

    /// Ledger entry time-to-live.
    #[must_use]
    pub fn ledger_ttl(&self) -> Duration {
        Duration::from_secs(self.ledger_ttl_secs)
    }
}
