//! Unified market-data gateway.
//!
//! One object owning both halves of the data layer: the request
//! throttler for paced REST-style fetches and the live feed for
//! streamed price updates. Callers interact with this facade only.

use crate::config::AppConfig;
use crate::error::AppResult;
use parking_lot::Mutex;
use std::sync::Arc;
use stockfeed_core::{Admission, ApiKind, FetchIntent};
use stockfeed_throttle::RequestThrottler;
use stockfeed_ws::{init_crypto, ConnectionState, LiveFeed, LiveUpdateStream, WsResult};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct Gateway {
    throttler: RequestThrottler,
    feed: Arc<LiveFeed>,
    feed_task: Mutex<Option<JoinHandle<WsResult<()>>>>,
}

impl Gateway {
    /// Build a gateway from configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.throttle.validate()?;
        init_crypto();
        Ok(Self {
            throttler: RequestThrottler::with_config(config.throttle),
            feed: Arc::new(LiveFeed::with_config(config.feed)),
            feed_task: Mutex::new(None),
        })
    }

    /// Register the dispatch handler for an API kind. The first
    /// registration wins; later ones for the same kind are ignored.
    pub fn register_handler<F>(&self, kind: ApiKind, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.throttler.register_handler(kind, handler);
    }

    /// Submit a fetch intent to the throttler.
    pub fn fetch(&self, intent: FetchIntent) -> Admission {
        self.throttler.enqueue(intent)
    }

    /// Requests currently waiting for dispatch.
    pub fn queued(&self) -> usize {
        self.throttler.queued()
    }

    /// Open the streaming connection in the background.
    ///
    /// A second call supersedes the previous connection; at most one
    /// socket exists at any instant.
    pub fn connect(&self, token: &str) {
        let feed = self.feed.clone();
        let token = token.to_string();
        let handle = tokio::spawn(async move {
            let result = feed.run(&token).await;
            if let Err(ref e) = result {
                warn!(?e, "Live feed terminated with error");
            }
            result
        });

        if let Some(previous) = self.feed_task.lock().replace(handle) {
            // The new run cancels the old token; the old task winds
            // itself down.
            drop(previous);
        }
    }

    /// Current streaming connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.feed.state()
    }

    /// Subscribe to the shared live-update stream.
    pub fn updates(&self) -> LiveUpdateStream {
        self.feed.updates()
    }

    /// Open the streaming connection and return the shared stream in
    /// one step.
    pub fn live_updates(&self, token: &str) -> LiveUpdateStream {
        let stream = self.updates();
        self.connect(token);
        stream
    }

    /// Subscribe to live updates for a symbol. Buffered until the
    /// connection opens if issued early.
    pub async fn subscribe(&self, symbol: impl Into<String>) {
        self.feed.subscribe(symbol).await;
    }

    /// Unsubscribe from live updates for a symbol.
    pub async fn unsubscribe(&self, symbol: &str) {
        self.feed.unsubscribe(symbol).await;
    }

    /// Close the streaming connection and wait for the socket task to
    /// finish. Idempotent.
    pub async fn close(&self) {
        self.feed.close();
        let task = self.feed_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(?e, "Feed task join failed");
            }
        }
    }

    /// Tear everything down: the streaming connection and the
    /// throttler drain task. No callback fires after this returns.
    pub async fn shutdown(&self) {
        info!("Shutting down gateway");
        self.close().await;
        self.throttler.shutdown().await;
    }
}
