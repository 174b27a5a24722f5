//! Admission-controlled request throttler.
//!
//! Queues fetch intents to limit the number of upstream requests per
//! second and to keep the requests worth making:
//! - Duplicate suppression via the admission ledger (a symbol fetched
//!   recently is not fetched again; pass a forced intent to bypass)
//! - Staleness dropping (queued requests whose originating UI position
//!   has drifted far from the newest queued position are discarded)
//! - One drain task paced at a fixed inter-request interval, stopped
//!   cleanly via cancellation token

pub mod config;
pub mod error;
pub mod ledger;
pub mod queue;
pub mod throttler;

pub use config::ThrottleConfig;
pub use error::{ThrottleError, ThrottleResult};
pub use ledger::AdmissionLedger;
pub use queue::RequestQueue;
pub use throttler::{Handler, RequestThrottler};
