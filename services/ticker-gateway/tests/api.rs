//! End-to-end tests against a gateway bound to an ephemeral port.

use axum::http::{HeaderValue, header::AUTHORIZATION};
use futures::StreamExt;
use headers::{Authorization, Header};
use price_feed::{FeedConfig, TickerService};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use ticker_gateway::auth::UserStore;
use ticker_gateway::config::SessionConfig;
use ticker_gateway::{AppState, CLOSE_FORBIDDEN, create_router};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    service: Arc<TickerService>,
}

async fn spawn_server() -> TestServer {
    let config = FeedConfig {
        tick_interval: Duration::from_millis(50),
        seed: Some(42),
        ..FeedConfig::default()
    };
    let service = Arc::new(TickerService::new(config).unwrap());
    let users = Arc::new(UserStore::from_pairs([("admin", "changeme")]));
    let app = create_router(AppState::new(
        Arc::clone(&service),
        users,
        SessionConfig::default(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    service.start().await;

    TestServer { addr, service }
}

fn basic_header(user: &str, pass: &str) -> HeaderValue {
    let mut values = Vec::new();
    Authorization::basic(user, pass).encode(&mut values);
    values.remove(0)
}

async fn next_text(client: &mut WsClient) -> serde_json::Value {
    loop {
        let message = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a batch")
            .expect("stream ended")
            .expect("websocket error");
        match message {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

async fn wait_for_subscribers(service: &TickerService, expected: usize) {
    timeout(Duration::from_secs(5), async {
        while service.subscriber_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriber count never settled");
}

fn assert_ticker_batch(batch: &serde_json::Value) {
    assert_eq!(batch["type"], "ticker_batch");
    let data = batch["data"].as_array().unwrap();
    let symbols: Vec<&str> = data.iter().map(|u| u["symbol"].as_str().unwrap()).collect();
    assert_eq!(symbols, ["AAPL", "AMZN", "GOOG", "MSFT"]);
    for update in data {
        assert!(update["price"].as_f64().unwrap() >= 0.01);
        assert!(update["change"].is_number());
        assert!(update["percent_change"].is_number());
        assert!(update["last_updated"].is_string());
    }
}

#[tokio::test]
async fn test_health_over_http() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/health", server.addr);

    let response = client
        .get(&url)
        .basic_auth("admin", Some("changeme"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "UNAUTHORIZED");

    server.service.stop().await;
}

#[tokio::test]
async fn test_stream_with_basic_header() {
    let server = spawn_server().await;

    let mut request = format!("ws://{}/ws/ticker", server.addr)
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert(AUTHORIZATION, basic_header("admin", "changeme"));
    let (mut client, _) = connect_async(request).await.unwrap();

    let first = next_text(&mut client).await;
    assert_ticker_batch(&first);
    let second = next_text(&mut client).await;
    assert_ticker_batch(&second);
    assert_eq!(server.service.subscriber_count(), 1);

    client.close(None).await.unwrap();
    wait_for_subscribers(&server.service, 0).await;

    server.service.stop().await;
}

#[tokio::test]
async fn test_stream_with_query_credentials() {
    let server = spawn_server().await;

    let url = format!(
        "ws://{}/ws/ticker?username=admin&password=changeme",
        server.addr
    );
    let (mut client, _) = connect_async(url).await.unwrap();
    assert_ticker_batch(&next_text(&mut client).await);

    drop(client);
    wait_for_subscribers(&server.service, 0).await;

    server.service.stop().await;
}

#[tokio::test]
async fn test_stream_rejects_bad_credentials() {
    let server = spawn_server().await;

    for url in [
        format!("ws://{}/ws/ticker", server.addr),
        format!("ws://{}/ws/ticker?username=admin&password=wrong", server.addr),
        format!("ws://{}/ws/ticker?username=admin", server.addr),
    ] {
        let (mut client, _) = connect_async(url).await.unwrap();
        let message = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for close")
            .expect("stream ended before close frame")
            .expect("websocket error");

        match message {
            Message::Close(Some(frame)) => {
                assert_eq!(u16::from(frame.code), CLOSE_FORBIDDEN);
                assert_eq!(frame.reason.as_str(), "forbidden");
            }
            other => panic!("expected close frame, got {other:?}"),
        }
        assert_eq!(server.service.subscriber_count(), 0);
    }

    server.service.stop().await;
}

#[tokio::test]
async fn test_many_streams_share_batches() {
    let server = spawn_server().await;

    let mut clients = Vec::new();
    for _ in 0..5 {
        let url = format!(
            "ws://{}/ws/ticker?username=admin&password=changeme",
            server.addr
        );
        let (client, _) = connect_async(url).await.unwrap();
        clients.push(client);
    }
    wait_for_subscribers(&server.service, 5).await;

    for client in &mut clients {
        assert_ticker_batch(&next_text(client).await);
    }

    clients.truncate(2);
    wait_for_subscribers(&server.service, 2).await;

    server.service.stop().await;
    assert!(!server.service.is_running().await);
}

#[tokio::test]
async fn test_unregistered_stream_is_closed_by_server() {
    let server = spawn_server().await;

    let url = format!(
        "ws://{}/ws/ticker?username=admin&password=changeme",
        server.addr
    );
    let (mut client, _) = connect_async(url).await.unwrap();
    wait_for_subscribers(&server.service, 1).await;

    let ids = server.service.subscriber_ids();
    assert_eq!(ids.len(), 1);
    assert!(server.service.unregister(&ids[0]));

    let closed = timeout(Duration::from_secs(5), async {
        while let Some(message) = client.next().await {
            match message.expect("websocket error") {
                Message::Close(_) => return true,
                Message::Text(_) | Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected message: {other:?}"),
            }
        }
        false
    })
    .await
    .expect("timed out waiting for close");

    assert!(closed, "stream ended without a close frame");
    assert_eq!(server.service.subscriber_count(), 0);

    server.service.stop().await;
}
