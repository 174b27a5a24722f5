//! The request throttler.
//!
//! A single background drain task consumes the request queue at a
//! fixed pace and dispatches each entry to the handler registered for
//! its API kind. Entries whose originating UI position has drifted too
//! far from the newest queued position are discarded instead of
//! dispatched; the pacing tick is consumed either way.

use crate::config::ThrottleConfig;
use crate::ledger::AdmissionLedger;
use crate::queue::RequestQueue;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use stockfeed_core::{Admission, ApiKind, FetchIntent};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-kind dispatch callback.
///
/// Receives the symbol of the request being dispatched. The callback
/// owns the actual network call; the throttler only guarantees that it
/// was invoked, never that it succeeded, and performs no retries.
pub type Handler = Arc<dyn Fn(&str) + Send + Sync>;

/// Admission-controlled, rate-paced request scheduler.
///
/// Cheap to clone; all clones share the same queue, ledger, handler
/// table and drain task.
///
/// The drain task starts lazily on the first `enqueue` or
/// `register_handler` call and must therefore happen inside a tokio
/// runtime. `shutdown` stops the task, clears the queue and unbinds
/// all handlers; the throttler restarts on the next use.
#[derive(Clone)]
pub struct RequestThrottler {
    inner: Arc<Inner>,
}

struct Inner {
    config: ThrottleConfig,
    queue: RequestQueue,
    ledger: AdmissionLedger,
    handlers: RwLock<HashMap<ApiKind, Handler>>,
    drain: Mutex<Option<DrainTask>>,
}

struct DrainTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RequestThrottler {
    /// Create a throttler with default configuration.
    pub fn new() -> Self {
        Self::with_config(ThrottleConfig::default())
    }

    /// Create a throttler with custom configuration.
    pub fn with_config(config: ThrottleConfig) -> Self {
        let ledger = AdmissionLedger::new(config.ledger_ttl());
        Self {
            inner: Arc::new(Inner {
                config,
                queue: RequestQueue::new(),
                ledger,
                handlers: RwLock::new(HashMap::new()),
                drain: Mutex::new(None),
            }),
        }
    }

    /// Submit a fetch intent.
    ///
    /// Un-forced intents are suppressed when the admission ledger
    /// holds a fresh entry for the symbol, or when an entry for the
    /// same `(symbol, api_kind)` is already queued. Suppression is a
    /// deliberate no-op reported as data, not an error.
    pub fn enqueue(&self, intent: FetchIntent) -> Admission {
        if !intent.ignore_duplicate && self.inner.ledger.is_fresh(&intent.symbol) {
            debug!(symbol = %intent.symbol, kind = %intent.api_kind, "Admission suppressed by ledger");
            return Admission::Suppressed;
        }

        let symbol = intent.symbol.clone();
        let kind = intent.api_kind;
        if !self.inner.queue.push(intent.into()) {
            debug!(symbol = %symbol, kind = %kind, "Admission suppressed, already queued");
            return Admission::Suppressed;
        }

        self.ensure_running();
        Admission::Accepted
    }

    /// Bind the callback for an API kind.
    ///
    /// First registration wins: re-registering a kind that already has
    /// a handler is a silent no-op.
    pub fn register_handler<F>(&self, kind: ApiKind, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        {
            let mut handlers = self.inner.handlers.write();
            if handlers.contains_key(&kind) {
                debug!(%kind, "Handler already bound, keeping first registration");
                return;
            }
            handlers.insert(kind, Arc::new(handler));
        }
        self.ensure_running();
    }

    /// Stop the drain task, clear the queue and unbind all handlers.
    ///
    /// Awaits the drain task's termination, so no handler invocation
    /// happens after this returns. The admission ledger survives; the
    /// throttler restarts lazily on the next `enqueue` or
    /// `register_handler`.
    pub async fn shutdown(&self) {
        let task = self.inner.drain.lock().take();
        if let Some(task) = task {
            task.token.cancel();
            let _ = task.handle.await;
        }
        self.inner.queue.clear();
        self.inner.handlers.write().clear();
        debug!("Throttler shut down");
    }

    /// Number of queued entries (observability).
    pub fn queued(&self) -> usize {
        self.inner.queue.len()
    }

    fn ensure_running(&self) {
        let mut drain = self.inner.drain.lock();
        if let Some(task) = drain.as_ref() {
            if !task.handle.is_finished() {
                return;
            }
        }

        let token = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { drain_loop(inner, loop_token).await });
        *drain = Some(DrainTask { token, handle });
    }
}

impl Default for RequestThrottler {
    fn default() -> Self {
        Self::new()
    }
}

async fn drain_loop(inner: Arc<Inner>, token: CancellationToken) {
    loop {
        if token.is_cancelled() {
            break;
        }

        let pause = if let Some((request, tail_position)) = inner.queue.pop_with_tail() {
            let distance = (request.position - tail_position).unsigned_abs();
            if request.drop_if_stale && distance >= inner.config.staleness_threshold {
                debug!(
                    symbol = %request.symbol,
                    kind = %request.api_kind,
                    distance,
                    "Dropped stale request"
                );
            } else {
                let handler = inner.handlers.read().get(&request.api_kind).cloned();
                match handler {
                    Some(handler) => handler(&request.symbol),
                    None => warn!(kind = %request.api_kind, "No handler bound, request dropped"),
                }
                inner.ledger.record(&request.symbol);
            }
            inner.config.dispatch_interval()
        } else {
            inner.config.idle_poll_interval()
        };

        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(pause) => {}
        }
    }
}
