//! Streaming connection configuration.

use serde::{Deserialize, Serialize};

/// Streaming connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint URL. The auth token is appended as a query
    /// parameter at open time.
    #[serde(default = "default_url")]
    pub url: String,
    /// Capacity of the shared live-update buffer. When a consumer
    /// falls behind by more than this many events, the oldest buffered
    /// events are dropped in favor of newer ones.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_url() -> String {
    "wss://ws.finnhub.io".to_string()
}

fn default_event_buffer() -> usize {
    256
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl FeedConfig {
    /// Build the connection URL for a token.
    #[must_use]
    pub fn url_with_token(&self, token: &str) -> String {
        format!("{}?token={}", self.url, token)
    }
}
