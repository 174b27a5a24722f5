//! Shared identifiers for the gateway.

use serde::{Deserialize, Serialize};

/// A ticker symbol (e.g., "AAPL", "BINANCE:BTCUSDT").
pub type Symbol = String;

/// Remote API endpoint a fetch intent targets.
///
/// Each kind has exactly one handler bound for the lifetime of the
/// throttler; the throttler dispatches by kind and never inspects
/// what the handler does with the symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    /// Company profile (name, industry, market cap).
    CompanyProfile,
    /// Company news articles.
    CompanyNews,
    /// Current quote (price, day change).
    CompanyQuote,
    /// Historical OHLC candles.
    StockCandles,
    /// Exchange symbol directory.
    StockSymbols,
}

impl ApiKind {
    /// Get all API kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::CompanyProfile,
            Self::CompanyNews,
            Self::CompanyQuote,
            Self::StockCandles,
            Self::StockSymbols,
        ]
    }
}

impl std::fmt::Display for ApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CompanyProfile => write!(f, "company_profile"),
            Self::CompanyNews => write!(f, "company_news"),
            Self::CompanyQuote => write!(f, "company_quote"),
            Self::StockCandles => write!(f, "stock_candles"),
            Self::StockSymbols => write!(f, "stock_symbols"),
        }
    }
}
