//! Core domain types for the stockfeed market data gateway.
//!
//! This crate provides the fundamental types shared by the throttler,
//! the streaming multiplexer and the gateway facade:
//! - `ApiKind`: the remote endpoints a fetch can target
//! - `FetchIntent` / `PendingRequest`: admission-queue entries
//! - `Admission`: outcome of an enqueue attempt
//! - `LiveUpdate`, `UpdateCode`: parsed streaming price events

pub mod request;
pub mod types;
pub mod update;

pub use request::{Admission, FetchIntent, PendingRequest};
pub use types::{ApiKind, Symbol};
pub use update::{LiveUpdate, UpdateCode};
