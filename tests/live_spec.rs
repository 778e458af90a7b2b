//! Real-time channel tests against a bound server.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use timmyos::api::{create_router, AppState};
use timmyos::config::Settings;
use timmyos::models::EventKind;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;

const API_KEY: &str = "live-secret";

async fn start() -> (SocketAddr, AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = AppState::new(Settings::for_root(dir.path(), API_KEY));
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    (addr, state, dir)
}

async fn wait_for_subscribers(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.hub.subscriber_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "expected {} subscribers, have {}",
        expected,
        state.hub.subscriber_count()
    );
}

type Client =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("no message within timeout")
            .expect("stream ended")
            .expect("websocket error");
        match message {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected text, got {:?}", other),
        }
    }
}

async fn expect_policy_close(url: String, state: &AppState) {
    let (mut client, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("handshake should still complete");

    // Anything broadcast now must not reach the rejected client.
    state.hub.broadcast(EventKind::System, &json!({ "unseen": true }));

    let first = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("no close within timeout")
        .expect("stream ended without a close frame")
        .expect("websocket error");
    match first {
        Message::Close(Some(frame)) => {
            assert_eq!(frame.code, CloseCode::Policy);
            assert_eq!(frame.reason, "Invalid API key");
        }
        other => panic!("expected a policy close, got {:?}", other),
    }
    assert_eq!(state.hub.subscriber_count(), 0);
}

#[tokio::test]
async fn wrong_key_is_closed_with_policy_violation() {
    let (addr, state, _dir) = start().await;
    expect_policy_close(format!("ws://{}/ws?key=nope", addr), &state).await;
}

#[tokio::test]
async fn missing_key_is_closed_with_policy_violation() {
    let (addr, state, _dir) = start().await;
    expect_policy_close(format!("ws://{}/ws", addr), &state).await;
}

#[tokio::test]
async fn disconnecting_removes_the_subscriber() {
    let (addr, state, _dir) = start().await;
    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws?key={}", addr, API_KEY))
        .await
        .unwrap();
    wait_for_subscribers(&state, 1).await;

    client.close(None).await.unwrap();
    wait_for_subscribers(&state, 0).await;
}

#[tokio::test]
async fn two_dashboards_see_a_task_added_by_one_of_them() {
    let (addr, state, _dir) = start().await;
    let url = format!("ws://{}/ws?key={}", addr, API_KEY);
    let (mut alice, _) = tokio_tungstenite::connect_async(url.clone()).await.unwrap();
    let (mut bob, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    wait_for_subscribers(&state, 2).await;

    let http = reqwest::Client::new();
    let created = http
        .post(format!("http://{}/api/tasks", addr))
        .header("X-API-Key", API_KEY)
        .json(&json!({ "title": "Water the plants", "priority": "low" }))
        .send()
        .await
        .unwrap();
    assert!(created.status().is_success());

    for client in [&mut alice, &mut bob] {
        let event = next_json(client).await;
        assert_eq!(event["type"], "tasks");
        assert_eq!(event["data"][0]["title"], "Water the plants");
        assert!(event["timestamp"].is_i64());
    }

    let listed: Value = http
        .get(format!("http://{}/api/tasks", addr))
        .header("X-API-Key", API_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed[0]["title"], "Water the plants");
}
