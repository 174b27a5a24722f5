//! Live price update events.

use crate::types::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response code carried by a live update.
///
/// `Error` and `SocketClosed` are terminal: the stream ends after one
/// of them is observed and the caller must open a new connection. The
/// presentation layer uses them to distinguish a dead stream from
/// "no data yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCode {
    /// A regular price tick.
    Ok,
    /// The socket reported an error.
    Error,
    /// The socket was closed (by either side).
    SocketClosed,
}

/// A parsed inbound streaming frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUpdate {
    /// Symbol the tick is for. Empty for terminal events that are not
    /// tied to a single subscription.
    pub symbol: Symbol,
    /// Last traded price.
    pub price: Decimal,
    /// Outcome code.
    pub code: UpdateCode,
}

impl LiveUpdate {
    /// Create a regular price tick.
    pub fn tick(symbol: impl Into<Symbol>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            code: UpdateCode::Ok,
        }
    }

    /// Create a terminal closed event.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            symbol: Symbol::new(),
            price: Decimal::ZERO,
            code: UpdateCode::SocketClosed,
        }
    }

    /// Create a terminal error event.
    #[must_use]
    pub fn error() -> Self {
        Self {
            symbol: Symbol::new(),
            price: Decimal::ZERO,
            code: UpdateCode::Error,
        }
    }

    /// Check whether this event ends the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.code, UpdateCode::Error | UpdateCode::SocketClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick() {
        let update = LiveUpdate::tick("AAPL", dec!(178.42));
        assert_eq!(update.symbol, "AAPL");
        assert_eq!(update.price, dec!(178.42));
        assert_eq!(update.code, UpdateCode::Ok);
        assert!(!update.is_terminal());
    }

    #[test]
    fn test_terminal_events() {
        assert!(LiveUpdate::closed().is_terminal());
        assert!(LiveUpdate::error().is_terminal());
        assert_eq!(LiveUpdate::closed().code, UpdateCode::SocketClosed);
    }
}
