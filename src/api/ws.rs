//! Real-time channel: `GET /ws?key=<secret>` upgraded to a WebSocket that
//! receives every hub broadcast until either side closes.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};

use super::AppState;
use crate::hub::BroadcastHub;

#[derive(Debug, Deserialize)]
pub struct LiveParams {
    key: Option<String>,
}

pub async fn live_updates(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<LiveParams>,
) -> Response {
    let authorized = params.key.as_deref() == Some(state.settings.api_key.as_str());
    ws.on_upgrade(move |socket| async move {
        if authorized {
            stream_events(socket, state.hub).await;
        } else {
            reject(socket).await;
        }
    })
}

/// Closes with a policy-violation code before anything is registered.
async fn reject(mut socket: WebSocket) {
    warn!("WebSocket connection rejected: invalid API key");
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: "Invalid API key".into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

async fn stream_events(socket: WebSocket, hub: BroadcastHub) {
    let mut subscription = hub.subscribe();
    let client = subscription.id();
    info!(client, "Client connected (authenticated)");

    let (mut sink, mut incoming) = socket.split();
    loop {
        tokio::select! {
            outgoing = subscription.recv() => {
                let Some(text) = outgoing else { break };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            received = incoming.next() => match received {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients never send anything meaningful; pings are answered by axum.
                Some(Ok(_)) => {}
            },
        }
    }

    drop(subscription);
    info!(client, "Client disconnected");
}
