//! Market-data gateway.
//!
//! The top-level facade over the two data-layer components:
//! - [`stockfeed_throttle::RequestThrottler`] paces and deduplicates
//!   per-symbol fetch requests
//! - [`stockfeed_ws::LiveFeed`] multiplexes live price subscriptions
//!   over a single streaming connection
//!
//! ```no_run
//! use stockfeed_core::{ApiKind, FetchIntent};
//! use stockfeed_gateway::{AppConfig, Gateway};
//!
//! # async fn example() -> stockfeed_gateway::AppResult<()> {
//! let gateway = Gateway::new(AppConfig::load()?)?;
//! gateway.register_handler(ApiKind::CompanyQuote, |symbol| {
//!     println!("fetch quote for {symbol}");
//! });
//! gateway.fetch(FetchIntent::new("AAPL", ApiKind::CompanyQuote));
//!
//! gateway.connect("my-token");
//! gateway.subscribe("AAPL").await;
//! let mut updates = gateway.updates();
//! while let Some(update) = updates.recv().await {
//!     println!("{}: {}", update.symbol, update.price);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use gateway::Gateway;
pub use logging::init_logging;
