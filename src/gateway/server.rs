//! WebSocket endpoint. Each connection gets a reader loop feeding the
//! gateway inbox and a writer task draining its outbound queue.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Connection lifecycle and traffic, as seen by the gateway.
#[derive(Debug)]
pub enum ClientEvent {
    Connected {
        id: Uuid,
        tx: mpsc::Sender<String>,
    },
    Message {
        id: Uuid,
        text: String,
    },
    Disconnected {
        id: Uuid,
    },
}

#[derive(Clone)]
struct ServerState {
    inbox: mpsc::Sender<ClientEvent>,
    client_buffer: usize,
}

/// Routes accepting WebSocket upgrades on `/` and `/ws`.
pub fn router(inbox: mpsc::Sender<ClientEvent>, client_buffer: usize) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .with_state(ServerState {
            inbox,
            client_buffer: client_buffer.max(1),
        })
}

async fn ws_handler(State(state): State<ServerState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ServerState) {
    let id = Uuid::new_v4();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(state.client_buffer);

    if state
        .inbox
        .send(ClientEvent::Connected { id, tx })
        .await
        .is_err()
    {
        warn!("gateway is gone, refusing client {id}");
        return;
    }
    info!("client {id} connected");

    let writer = tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("client {id} transport error: {e}");
                break;
            }
        };
        if state
            .inbox
            .send(ClientEvent::Message { id, text })
            .await
            .is_err()
        {
            break;
        }
    }

    info!("client {id} disconnected");
    let _ = state.inbox.send(ClientEvent::Disconnected { id }).await;
    writer.abort();
}
