//! Streaming multiplexer for live price updates.
//!
//! Maintains exactly one WebSocket connection to the streaming
//! endpoint and multiplexes per-symbol subscriptions over it:
//! - Subscribe intents issued before the connection exists are
//!   buffered and replayed in FIFO order the instant the socket opens
//! - Inbound frames are decoded off the caller's task and fanned out
//!   to any number of consumers over one shared broadcast stream
//! - Slow consumers lose the oldest buffered events first
//! - Cancellation closes the socket before completing; no automatic
//!   reconnection

pub mod config;
pub mod error;
pub mod frame;
pub mod multiplexer;
pub mod subscription;

pub use config::FeedConfig;
pub use error::{WsError, WsResult};
pub use frame::{StreamMessage, TradeTick, WsRequest, CLOSE_NORMAL};
pub use multiplexer::{ConnectionState, LiveFeed, LiveUpdateStream};
pub use subscription::SubscriptionBook;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
