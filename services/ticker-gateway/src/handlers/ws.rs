use crate::auth::{CredentialQuery, resolve_credentials};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use price_feed::Subscriber;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use types::errors::DeliveryError;
use types::ids::SubscriberId;

/// Close code sent to streaming clients whose credentials were rejected.
pub const CLOSE_FORBIDDEN: u16 = 4403;

/// Registry handle for one socket: a bounded queue drained by the session.
pub struct WsSubscriber {
    id: SubscriberId,
    outbound: mpsc::Sender<Arc<str>>,
}

impl WsSubscriber {
    pub fn new(outbound: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id: SubscriberId::new(),
            outbound,
        }
    }
}

#[async_trait]
impl Subscriber for WsSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    async fn send_json(&self, json: Arc<str>) -> Result<(), DeliveryError> {
        self.outbound.try_send(json).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Backlogged,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CredentialQuery>,
) -> Response {
    let authorized = resolve_credentials(&headers, &query)
        .is_some_and(|credentials| state.users.verify(&credentials));

    // Always upgrade; rejected clients get a distinguishable close code
    // instead of a failed handshake.
    ws.on_upgrade(move |socket| async move {
        if authorized {
            handle_socket(socket, state).await;
        } else {
            reject(socket).await;
        }
    })
}

async fn reject(mut socket: WebSocket) {
    debug!("Rejecting unauthenticated ticker stream");
    let frame = CloseFrame {
        code: CLOSE_FORBIDDEN,
        reason: "forbidden".into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<Arc<str>>(state.session.outbound_buffer);
    let Some(registration) = state.service.register(Arc::new(WsSubscriber::new(tx))) else {
        warn!("Subscriber id collision; dropping ticker stream");
        return;
    };
    let subscriber_id = registration.id();
    info!(%subscriber_id, "Ticker stream connected");

    let (mut sink, mut stream) = socket.split();
    let mut keepalive = tokio::time::interval(state.session.keepalive_interval);
    keepalive.tick().await;

    let end = loop {
        tokio::select! {
            outbound = rx.recv() => {
                // `None`: the registry let go of this subscriber.
                let Some(json) = outbound else { break SessionEnd::Unregistered };
                if sink.send(Message::Text((&*json).into())).await.is_err() {
                    break SessionEnd::SendFailed;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break SessionEnd::ClientGone,
                // Clients have nothing to say on this stream.
                Some(Ok(_)) => {}
            },
            _ = keepalive.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break SessionEnd::SendFailed;
                }
            }
        }
    };

    if end != SessionEnd::ClientGone {
        let _ = sink.send(Message::Close(None)).await;
    }
    drop(registration);
    info!(%subscriber_id, ?end, "Ticker stream disconnected");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    ClientGone,
    Unregistered,
    SendFailed,
}
