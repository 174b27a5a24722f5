//! The streaming multiplexer.
//!
//! Owns the single WebSocket connection and fans many per-symbol
//! subscriptions into it. `run` is the long-lived socket task: it
//! resolves only when the socket closes, errors, or the feed is
//! cancelled, and cancellation sends the close frame before the task
//! completes so no orphaned connection survives it.

use crate::config::FeedConfig;
use crate::error::{WsError, WsResult};
use crate::frame::{StreamMessage, WsRequest, CLOSE_NORMAL};
use crate::subscription::SubscriptionBook;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use stockfeed_core::LiveUpdate;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, Mutex as TokioMutex};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Tokens tracking one `run` invocation. `done` fires only after the
/// run has fully torn down its socket.
struct RunState {
    cancel: CancellationToken,
    done: CancellationToken,
}

impl RunState {
    fn idle() -> Self {
        let done = CancellationToken::new();
        done.cancel();
        Self {
            cancel: CancellationToken::new(),
            done,
        }
    }
}

/// Shared live-update stream.
///
/// Wraps a broadcast receiver; every consumer observes the same
/// sequence without re-opening the socket. When a consumer falls
/// behind the buffer bound, the oldest buffered events are dropped
/// and delivery resumes with the newest ones, still in order.
pub struct LiveUpdateStream {
    rx: broadcast::Receiver<LiveUpdate>,
}

impl LiveUpdateStream {
    /// Receive the next update.
    ///
    /// Returns `None` once the feed itself has been dropped. A closed
    /// or failed socket is reported in-band as a terminal update, not
    /// by ending the stream, so a stalled stream is distinguishable
    /// from "no data yet".
    pub async fn recv(&mut self) -> Option<LiveUpdate> {
        loop {
            match self.rx.recv().await {
                Ok(update) => return Some(update),
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    warn!(dropped, "Slow consumer, dropped oldest updates");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Single-connection subscription multiplexer.
pub struct LiveFeed {
    config: FeedConfig,
    state: Arc<RwLock<ConnectionState>>,
    book: Arc<SubscriptionBook>,
    events_tx: broadcast::Sender<LiveUpdate>,
    outbound_tx: mpsc::Sender<WsRequest>,
    /// Consumed by the run loop only.
    outbound_rx: Arc<TokioMutex<mpsc::Receiver<WsRequest>>>,
    /// Tokens of the current run; replaced when a new run supersedes it.
    run_state: Mutex<RunState>,
}

impl LiveFeed {
    /// Create a feed with default configuration.
    pub fn new() -> Self {
        Self::with_config(FeedConfig::default())
    }

    /// Create a feed with custom configuration.
    pub fn with_config(config: FeedConfig) -> Self {
        let (events_tx, _) = broadcast::channel(config.event_buffer);
        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            book: Arc::new(SubscriptionBook::new()),
            events_tx,
            outbound_tx,
            outbound_rx: Arc::new(TokioMutex::new(outbound_rx)),
            run_state: Mutex::new(RunState::idle()),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Symbols currently subscribed upstream.
    pub fn active_symbols(&self) -> Vec<String> {
        self.book.active_symbols()
    }

    /// Subscribe to the shared update stream.
    pub fn updates(&self) -> LiveUpdateStream {
        LiveUpdateStream {
            rx: self.events_tx.subscribe(),
        }
    }

    /// Subscribe to live updates for a symbol.
    ///
    /// Sends the subscribe frame immediately when connected; buffers
    /// the intent otherwise. Buffered intents are replayed in FIFO
    /// order the instant the connection opens and are never lost.
    pub async fn subscribe(&self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if self.state() == ConnectionState::Connected {
            self.book.mark_active(symbol.clone());
            if self.outbound_tx.send(WsRequest::subscribe(symbol)).await.is_err() {
                warn!("Outbound channel closed, subscribe dropped");
            }
        } else {
            debug!(%symbol, "Not connected, buffering subscribe intent");
            self.book.buffer(symbol);
        }
    }

    /// Unsubscribe from live updates for a symbol.
    ///
    /// While disconnected this only discards any pending intent;
    /// absence of a prior subscribe upstream is harmless.
    pub async fn unsubscribe(&self, symbol: &str) {
        if self.state() == ConnectionState::Connected {
            self.book.mark_inactive(symbol);
            if self
                .outbound_tx
                .send(WsRequest::unsubscribe(symbol))
                .await
                .is_err()
            {
                warn!("Outbound channel closed, unsubscribe dropped");
            }
        } else {
            self.book.cancel_pending(symbol);
        }
    }

    /// Close the connection with the normal close code.
    ///
    /// Idempotent: a second call is a no-op and no duplicate close
    /// frame is sent. The run loop sends the frame and resolves.
    pub fn close(&self) {
        let state = self.run_state.lock();
        if !state.cancel.is_cancelled() {
            info!("Closing live feed");
            state.cancel.cancel();
        }
    }

    /// Connect and run the socket loop until close, error or
    /// cancellation.
    ///
    /// Replays buffered subscribe intents in FIFO order as soon as
    /// the socket is ready, then multiplexes inbound frames into the
    /// shared update stream and outbound frames onto the socket.
    /// Calling `run` while a previous run is active supersedes it:
    /// the old connection is cancelled first, so at most one socket
    /// exists at any instant.
    pub async fn run(&self, token: &str) -> WsResult<()> {
        let (run_token, done_token, previous_done) = {
            let mut state = self.run_state.lock();
            if !state.cancel.is_cancelled() {
                state.cancel.cancel();
            }
            let previous_done = state.done.clone();
            let fresh = RunState {
                cancel: CancellationToken::new(),
                done: CancellationToken::new(),
            };
            let tokens = (fresh.cancel.clone(), fresh.done.clone(), previous_done);
            *state = fresh;
            tokens
        };

        // A superseded run closes its socket before its `done` token
        // fires; waiting here keeps the connection count at one.
        previous_done.cancelled().await;

        *self.state.write() = ConnectionState::Connecting;
        let url = self.config.url_with_token(token);
        info!(url = %self.config.url, "Connecting to stream");

        let (ws_stream, _response) = match connect_async(&url).await {
            Ok(ok) => ok,
            Err(e) => {
                *self.state.write() = ConnectionState::Disconnected;
                self.emit(LiveUpdate::error());
                done_token.cancel();
                return Err(e.into());
            }
        };
        let (mut write, mut read) = ws_stream.split();
        info!("Stream connected");

        let result = self.session(&run_token, &mut write, &mut read).await;

        *self.state.write() = ConnectionState::Disconnected;
        self.book.reset_active();
        match &result {
            // Cancellation, stream end and a server close frame end
            // the stream in an orderly way; anything else is an error
            // the consumer must see.
            Ok(()) | Err(WsError::ConnectionClosed { .. }) => self.emit(LiveUpdate::closed()),
            Err(_) => self.emit(LiveUpdate::error()),
        }
        done_token.cancel();
        result
    }

    /// Replay intents buffered while disconnected, flip the connected
    /// flag and flush once more so that anything buffered while the
    /// replay itself was in flight keeps its order, then hand off to
    /// the message loop.
    async fn session(
        &self,
        run_token: &CancellationToken,
        write: &mut WsSink,
        read: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
              + Unpin),
    ) -> WsResult<()> {
        self.flush_pending(write).await?;
        *self.state.write() = ConnectionState::Connected;
        self.flush_pending(write).await?;
        self.message_loop(run_token, write, read).await
    }

    async fn message_loop(
        &self,
        run_token: &CancellationToken,
        write: &mut WsSink,
        read: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
              + Unpin),
    ) -> WsResult<()> {
        loop {
            let outbound_recv = async { self.outbound_rx.lock().await.recv().await };

            tokio::select! {
                () = run_token.cancelled() => {
                    debug!("Cancellation requested, closing socket");
                    let frame = CloseFrame {
                        code: CloseCode::from(CLOSE_NORMAL),
                        reason: "".into(),
                    };
                    if let Err(e) = write.send(Message::Close(Some(frame))).await {
                        warn!(?e, "Failed to send close frame");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((CLOSE_NORMAL, "Normal close".to_string()));
                            warn!(code, %reason, "Stream closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            warn!(?e, "Stream read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("Stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                outbound = outbound_recv => {
                    if let Some(request) = outbound {
                        let text = serde_json::to_string(&request)?;
                        write.send(Message::Text(text)).await?;
                    }
                }
            }
        }
    }

    async fn flush_pending(&self, write: &mut WsSink) -> WsResult<()> {
        for symbol in self.book.drain_pending() {
            let text = serde_json::to_string(&WsRequest::subscribe(symbol.clone()))?;
            write.send(Message::Text(text)).await?;
            self.book.mark_active(symbol);
        }
        Ok(())
    }

    fn handle_text(&self, text: &str) {
        match serde_json::from_str::<StreamMessage>(text) {
            Ok(StreamMessage::Error { msg }) => {
                warn!(%msg, "Stream error frame");
            }
            Ok(StreamMessage::Ping) => {
                debug!("Stream keepalive");
            }
            Ok(message) => {
                for update in message.into_updates() {
                    self.emit(update);
                }
            }
            Err(e) => {
                debug!(?e, "Unparsable frame skipped");
            }
        }
    }

    fn emit(&self, update: LiveUpdate) {
        // Send fails only when no consumer is subscribed; ticks are
        // worthless without one anyway.
        let _ = self.events_tx.send(update);
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}
