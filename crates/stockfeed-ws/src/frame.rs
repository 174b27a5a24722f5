//! Wire frame types for the streaming endpoint.
//!
//! Outbound frames are `{"type":"subscribe","symbol":"<SYM>"}` and
//! `{"type":"unsubscribe","symbol":"<SYM>"}`. Inbound frames are
//! tagged the same way; `trade` frames batch several ticks into one
//! message.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockfeed_core::LiveUpdate;

/// Close code sent on teardown, by the caller or the multiplexer
/// itself (normal closure).
pub const CLOSE_NORMAL: u16 = 1000;

/// Outbound subscription frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsRequest {
    /// Start receiving trades for a symbol.
    Subscribe {
        /// Ticker symbol.
        symbol: String,
    },
    /// Stop receiving trades for a symbol.
    Unsubscribe {
        /// Ticker symbol.
        symbol: String,
    },
}

impl WsRequest {
    /// Create a subscribe frame.
    pub fn subscribe(symbol: impl Into<String>) -> Self {
        Self::Subscribe {
            symbol: symbol.into(),
        }
    }

    /// Create an unsubscribe frame.
    pub fn unsubscribe(symbol: impl Into<String>) -> Self {
        Self::Unsubscribe {
            symbol: symbol.into(),
        }
    }
}

/// One trade tick inside a `trade` frame.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeTick {
    /// Symbol.
    #[serde(rename = "s")]
    pub symbol: String,
    /// Last price.
    #[serde(rename = "p")]
    pub price: Decimal,
    /// Trade timestamp (UNIX ms).
    #[serde(rename = "t", default)]
    pub timestamp: Option<i64>,
    /// Trade volume.
    #[serde(rename = "v", default)]
    pub volume: Option<Decimal>,
}

/// Inbound streaming frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamMessage {
    /// A batch of trade ticks.
    Trade {
        /// The ticks, in upstream order.
        data: Vec<TradeTick>,
    },
    /// Server keepalive.
    Ping,
    /// Server-reported error.
    Error {
        /// Error description.
        #[serde(default)]
        msg: String,
    },
}

impl StreamMessage {
    /// Convert a trade frame into live updates, preserving tick order.
    /// Non-trade frames produce nothing.
    pub fn into_updates(self) -> Vec<LiveUpdate> {
        match self {
            Self::Trade { data } => data
                .into_iter()
                .map(|tick| LiveUpdate::tick(tick.symbol, tick.price))
                .collect(),
            Self::Ping | Self::Error { .. } => Vec::new(),
        }
    }
}
