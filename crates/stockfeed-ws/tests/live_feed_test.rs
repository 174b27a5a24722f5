//! Integration tests for the live feed against a mock streaming server.

mod common;

use common::MockStreamServer;
use std::sync::Arc;
use std::time::Duration;
use stockfeed_core::UpdateCode;
use stockfeed_ws::{ConnectionState, FeedConfig, LiveFeed};

fn feed_for(server: &MockStreamServer) -> Arc<LiveFeed> {
    Arc::new(LiveFeed::with_config(FeedConfig {
        url: server.url(),
        event_buffer: 64,
    }))
}

/// Poll until the condition holds or the timeout elapses.
async fn wait_for<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met within timeout");
}

async fn wait_connected(feed: &Arc<LiveFeed>) {
    let feed = feed.clone();
    wait_for(move || {
        let feed = feed.clone();
        async move { feed.state() == ConnectionState::Connected }
    })
    .await;
}

#[tokio::test]
async fn test_buffered_intents_replayed_in_fifo_order() {
    let server = MockStreamServer::start().await;
    let feed = feed_for(&server);

    // Subscribed before any connection exists.
    feed.subscribe("AAPL").await;
    feed.subscribe("MSFT").await;

    let runner = feed.clone();
    let handle = tokio::spawn(async move { runner.run("test-token").await });
    wait_connected(&feed).await;

    let srv = &server;
    wait_for(move || async move { srv.received_messages().await.len() == 2 }).await;
    assert_eq!(
        server.received_messages().await,
        vec![
            r#"{"type":"subscribe","symbol":"AAPL"}"#,
            r#"{"type":"subscribe","symbol":"MSFT"}"#,
        ]
    );

    feed.close();
    handle.await.unwrap().unwrap();
    server.shutdown().await;
}

#[tokio::test]
async fn test_subscribe_and_unsubscribe_while_connected() {
    let server = MockStreamServer::start().await;
    let feed = feed_for(&server);

    let runner = feed.clone();
    let handle = tokio::spawn(async move { runner.run("test-token").await });
    wait_connected(&feed).await;

    feed.subscribe("TSLA").await;
    feed.unsubscribe("TSLA").await;

    let srv = &server;
    wait_for(move || async move { srv.received_messages().await.len() == 2 }).await;
    assert_eq!(
        server.received_messages().await,
        vec![
            r#"{"type":"subscribe","symbol":"TSLA"}"#,
            r#"{"type":"unsubscribe","symbol":"TSLA"}"#,
        ]
    );
    assert!(feed.active_symbols().is_empty());

    feed.close();
    handle.await.unwrap().unwrap();
    server.shutdown().await;
}

#[tokio::test]
async fn test_trade_frames_fan_out_in_order() {
    let server = MockStreamServer::start().await;
    let feed = feed_for(&server);
    let mut stream = feed.updates();

    let runner = feed.clone();
    let handle = tokio::spawn(async move { runner.run("test-token").await });
    wait_connected(&feed).await;

    server.push(
        r#"{"type":"trade","data":[
            {"s":"AAPL","p":178.42,"t":1575526691134,"v":12},
            {"s":"MSFT","p":411.05,"t":1575526691135,"v":3}
        ]}"#,
    );

    let first = stream.recv().await.unwrap();
    assert_eq!(first.symbol, "AAPL");
    assert_eq!(first.code, UpdateCode::Ok);
    let second = stream.recv().await.unwrap();
    assert_eq!(second.symbol, "MSFT");

    feed.close();
    handle.await.unwrap().unwrap();
    server.shutdown().await;
}

#[tokio::test]
async fn test_close_is_idempotent_single_close_frame() {
    let server = MockStreamServer::start().await;
    let feed = feed_for(&server);

    let runner = feed.clone();
    let handle = tokio::spawn(async move { runner.run("test-token").await });
    wait_connected(&feed).await;

    feed.close();
    feed.close();
    handle.await.unwrap().unwrap();
    assert_eq!(feed.state(), ConnectionState::Disconnected);

    let srv = &server;
    wait_for(move || async move { srv.close_frame_count().await == 1 }).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.close_frame_count().await, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_close_emits_terminal_update() {
    let server = MockStreamServer::start().await;
    let feed = feed_for(&server);
    let mut stream = feed.updates();

    let runner = feed.clone();
    let handle = tokio::spawn(async move { runner.run("test-token").await });
    wait_connected(&feed).await;

    feed.close();
    handle.await.unwrap().unwrap();

    let update = stream.recv().await.unwrap();
    assert_eq!(update.code, UpdateCode::SocketClosed);
    assert!(update.is_terminal());

    server.shutdown().await;
}

#[tokio::test]
async fn test_non_trade_frames_are_skipped() {
    let server = MockStreamServer::start().await;
    let feed = feed_for(&server);
    let mut stream = feed.updates();

    let runner = feed.clone();
    let handle = tokio::spawn(async move { runner.run("test-token").await });
    wait_connected(&feed).await;

    server.push(r#"{"type":"ping"}"#);
    server.push(r#"{"type":"error","msg":"too many symbols"}"#);
    server.push(r#"{"type":"trade","data":[{"s":"GOOG","p":142.1}]}"#);

    // Only the trade frame produces an update.
    let update = stream.recv().await.unwrap();
    assert_eq!(update.symbol, "GOOG");

    feed.close();
    handle.await.unwrap().unwrap();
    server.shutdown().await;
}

#[tokio::test]
async fn test_connect_failure_reports_error() {
    let feed = Arc::new(LiveFeed::with_config(FeedConfig {
        url: "ws://127.0.0.1:1".to_string(),
        event_buffer: 64,
    }));
    let mut stream = feed.updates();

    let result = feed.run("test-token").await;
    assert!(result.is_err());
    assert_eq!(feed.state(), ConnectionState::Disconnected);

    // The failure is visible on the stream, not just in the result: a
    // consumer holding only the stream must not wait forever.
    let update = tokio::time::timeout(Duration::from_secs(1), stream.recv())
        .await
        .expect("terminal event must be broadcast")
        .unwrap();
    assert_eq!(update.code, UpdateCode::Error);
    assert!(update.is_terminal());
}

#[tokio::test]
async fn test_server_disconnect_resets_state_and_keeps_buffering() {
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    // A server that closes the socket immediately after the handshake.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let _ = ws.close(None).await;
    });

    let feed = Arc::new(LiveFeed::with_config(FeedConfig {
        url,
        event_buffer: 64,
    }));
    let mut stream = feed.updates();

    let _ = feed.run("test-token").await;
    assert_eq!(feed.state(), ConnectionState::Disconnected);

    let update = stream.recv().await.unwrap();
    assert!(update.is_terminal());

    // Subscribes after the teardown buffer to the book again; none of
    // them may block on a dead outbound channel.
    tokio::time::timeout(Duration::from_secs(1), async {
        for i in 0..70 {
            feed.subscribe(format!("SYM{i}")).await;
        }
    })
    .await
    .expect("subscribe must buffer while disconnected, not block");
}

#[tokio::test]
async fn test_new_run_supersedes_old_connection() {
    let server = MockStreamServer::start().await;
    let feed = feed_for(&server);

    let first_runner = feed.clone();
    let first = tokio::spawn(async move { first_runner.run("test-token").await });
    wait_connected(&feed).await;

    let second_runner = feed.clone();
    let second = tokio::spawn(async move { second_runner.run("test-token").await });

    // The old run tears down cleanly before the new one connects.
    first.await.unwrap().unwrap();
    wait_connected(&feed).await;

    let srv = &server;
    wait_for(move || async move { srv.close_frame_count().await == 1 }).await;
    wait_for(move || async move { srv.connection_count().await == 2 }).await;

    feed.close();
    second.await.unwrap().unwrap();
    server.shutdown().await;
}
