use super::session::{CONNECTED_STATUS, QR_STATUS};
use super::*;
use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_tungstenite::tungstenite;
use wabridge_core::error::BridgeError;
use wabridge_core::event::{ChatSnapshot, DisconnectReason, MessageKey, MessagePayload, WaMessage};
use wabridge_core::traits::WhatsAppClient;

// --- Mocks ---

#[derive(Default)]
struct MockClient {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

#[async_trait]
impl WhatsAppClient for MockClient {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<String, BridgeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::Client("server rejected message".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok("3EB0MOCK".to_string())
    }
}

#[derive(Default)]
struct MockConnector {
    client: Arc<MockClient>,
    connects: AtomicUsize,
    /// Connect attempts beyond this count fail.
    fail_after: Option<usize>,
}

#[async_trait]
impl Connector for MockConnector {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(
        &self,
        _events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn WhatsAppClient>, BridgeError> {
        let n = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_after.is_some_and(|limit| n > limit) {
            return Err(BridgeError::Client("unreachable".into()));
        }
        Ok(self.client.clone() as Arc<dyn WhatsAppClient>)
    }
}

fn session_with(connector: Arc<MockConnector>) -> Session {
    let (tx, _rx) = mpsc::channel(8);
    Session::new(connector, tx)
}

fn hub_with(connector: Arc<MockConnector>) -> Hub {
    Hub::new(session_with(connector), UserCache::new(true), "English", false)
}

fn closed(reason: DisconnectReason) -> ConnectionUpdate {
    ConnectionUpdate::closed(reason)
}

fn incoming(chat: &str, id: &str) -> WaMessage {
    WaMessage {
        key: MessageKey {
            remote_jid: chat.to_string(),
            from_me: false,
            id: id.to_string(),
        },
        message: Some(MessagePayload {
            conversation: Some("hello".into()),
            ..Default::default()
        }),
        timestamp: chrono::Utc::now().timestamp(),
        user_receipt: Vec::new(),
    }
}

/// Register a fake socket with the hub and return its outbound queue.
async fn attach(hub: &mut Hub) -> (Uuid, mpsc::Receiver<String>) {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(16);
    hub.on_client_event(ClientEvent::Connected { id, tx }).await;
    (id, rx)
}

fn next_json(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
    let raw = rx.try_recv().expect("expected a queued frame");
    serde_json::from_str(&raw).unwrap()
}

fn status_text(envelope: &Envelope) -> Option<&str> {
    match envelope {
        Envelope::Status { data } => Some(data.as_str()),
        _ => None,
    }
}

// --- Session ---

#[tokio::test]
async fn test_start_awaits_pairing() {
    let connector = Arc::new(MockConnector::default());
    let mut session = session_with(connector.clone());
    assert_eq!(session.state(), SessionState::Disconnected);

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::AwaitingPairing);
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_qr_yields_qr_and_status() {
    let mut session = session_with(Arc::new(MockConnector::default()));
    session.start().await.unwrap();

    let out = session
        .on_connection_update(ConnectionUpdate::qr("2@pairing"))
        .await;
    assert_eq!(out.len(), 2);
    assert!(matches!(&out[0], Envelope::Qr { data } if data == "2@pairing"));
    assert_eq!(status_text(&out[1]), Some(QR_STATUS));
    assert_eq!(session.state(), SessionState::AwaitingPairing);
}

#[tokio::test]
async fn test_open_connects() {
    let mut session = session_with(Arc::new(MockConnector::default()));
    session.start().await.unwrap();

    let out = session.on_connection_update(ConnectionUpdate::open()).await;
    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(status_text(&out[0]), Some(CONNECTED_STATUS));
}

#[tokio::test]
async fn test_non_logout_close_reconnects_once() {
    let connector = Arc::new(MockConnector::default());
    let mut session = session_with(connector.clone());
    session.start().await.unwrap();
    session.on_connection_update(ConnectionUpdate::open()).await;

    let out = session
        .on_connection_update(closed(DisconnectReason::ConnectionLost))
        .await;
    assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    assert_eq!(
        status_text(&out[0]),
        Some("Connection Closed: Connection Lost. Reconnecting: true")
    );
    assert_eq!(session.state(), SessionState::AwaitingPairing);
}

#[tokio::test]
async fn test_logout_does_not_reconnect() {
    let connector = Arc::new(MockConnector::default());
    let mut session = session_with(connector.clone());
    session.start().await.unwrap();
    session.on_connection_update(ConnectionUpdate::open()).await;

    let out = session
        .on_connection_update(closed(DisconnectReason::LoggedOut))
        .await;
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(
        status_text(&out[0]),
        Some("Connection Closed: Logged Out. Reconnecting: false")
    );

    let err = session.send_message("a@s.whatsapp.net", "hi").await;
    assert!(matches!(err, Err(BridgeError::NotConnected)));
}

#[tokio::test]
async fn test_failed_reconnect_disconnects() {
    let connector = Arc::new(MockConnector {
        fail_after: Some(1),
        ..Default::default()
    });
    let mut session = session_with(connector.clone());
    session.start().await.unwrap();

    let out = session
        .on_connection_update(closed(DisconnectReason::StreamReplaced))
        .await;
    assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(out.len(), 2);
    assert!(status_text(&out[1]).unwrap().starts_with("Reconnect failed"));
}

#[tokio::test]
async fn test_send_requires_client_then_arguments() {
    let connector = Arc::new(MockConnector::default());
    let mut session = session_with(connector.clone());

    // Not connected wins even over bad arguments.
    assert!(matches!(
        session.send_message("", "").await,
        Err(BridgeError::NotConnected)
    ));

    session.start().await.unwrap();
    assert!(matches!(
        session.send_message("", "hi").await,
        Err(BridgeError::InvalidArguments)
    ));
    assert!(matches!(
        session.send_message("a@s.whatsapp.net", "").await,
        Err(BridgeError::InvalidArguments)
    ));

    let id = session.send_message("a@s.whatsapp.net", "hi").await.unwrap();
    assert_eq!(id, "3EB0MOCK");
    assert_eq!(
        connector.client.sent.lock().unwrap().as_slice(),
        [("a@s.whatsapp.net".to_string(), "hi".to_string())]
    );
}

#[tokio::test]
async fn test_send_propagates_client_failure() {
    let connector = Arc::new(MockConnector::default());
    connector.client.fail.store(true, Ordering::SeqCst);
    let mut session = session_with(connector);
    session.start().await.unwrap();

    let err = session.send_message("a@s.whatsapp.net", "hi").await;
    assert!(matches!(err, Err(BridgeError::Client(msg)) if msg == "server rejected message"));
}

// --- Broadcaster ---

#[test]
fn test_broadcast_skips_closed_clients() {
    let mut clients = Broadcaster::new();
    let (tx1, mut rx1) = mpsc::channel(4);
    let (tx2, rx2) = mpsc::channel(4);
    let (tx3, mut rx3) = mpsc::channel(4);
    clients.add(Uuid::new_v4(), tx1);
    clients.add(Uuid::new_v4(), tx2);
    clients.add(Uuid::new_v4(), tx3);
    drop(rx2);

    let delivered = clients.broadcast(&Envelope::status("hello"));
    assert_eq!(delivered, 2);
    let expected = r#"{"type":"status","data":"hello"}"#;
    assert_eq!(rx1.try_recv().unwrap(), expected);
    assert_eq!(rx3.try_recv().unwrap(), expected);
}

#[test]
fn test_broadcast_drops_for_full_queue() {
    let mut clients = Broadcaster::new();
    let (slow_tx, mut slow_rx) = mpsc::channel(1);
    let (fast_tx, mut fast_rx) = mpsc::channel(8);
    clients.add(Uuid::new_v4(), slow_tx);
    clients.add(Uuid::new_v4(), fast_tx);

    assert_eq!(clients.broadcast(&Envelope::status("one")), 2);
    assert_eq!(clients.broadcast(&Envelope::status("two")), 1);

    assert!(slow_rx.try_recv().unwrap().contains("one"));
    assert!(slow_rx.try_recv().is_err());
    assert!(fast_rx.try_recv().unwrap().contains("one"));
    assert!(fast_rx.try_recv().unwrap().contains("two"));
}

#[test]
fn test_broadcast_without_clients() {
    let clients = Broadcaster::new();
    assert!(clients.is_empty());
    assert_eq!(clients.broadcast(&Envelope::status("nobody")), 0);
}

#[test]
fn test_send_to_unknown_client() {
    let clients = Broadcaster::new();
    assert!(!clients.send_to(&Uuid::new_v4(), &Envelope::error("x")));
}

// --- Hub ---

#[tokio::test]
async fn test_malformed_frame_errors_to_origin_only() {
    let mut hub = hub_with(Arc::new(MockConnector::default()));
    let (origin, mut origin_rx) = attach(&mut hub).await;
    let (_other, mut other_rx) = attach(&mut hub).await;

    hub.on_client_event(ClientEvent::Message {
        id: origin,
        text: "{not json".into(),
    })
    .await;

    assert_eq!(
        next_json(&mut origin_rx),
        serde_json::json!({"type": "error", "message": INVALID_FORMAT})
    );
    assert!(other_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_fields_take_no_action() {
    let connector = Arc::new(MockConnector::default());
    let mut hub = hub_with(connector.clone());
    hub.session.start().await.unwrap();
    let (id, mut rx) = attach(&mut hub).await;

    for text in [
        r#"{"type":"send_message","payload":{"chatId":"a@s.whatsapp.net"}}"#,
        r#"{"type":"send_message","payload":{"content":"hi"}}"#,
        r#"{"type":"send_message","payload":{"chatId":"","content":"hi"}}"#,
        r#"{"type":"typing","payload":{}}"#,
    ] {
        hub.on_client_event(ClientEvent::Message {
            id,
            text: text.into(),
        })
        .await;
    }

    assert!(connector.client.sent.lock().unwrap().is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_send_when_not_connected_reports_error() {
    let connector = Arc::new(MockConnector::default());
    let mut hub = hub_with(connector.clone());
    let (id, mut rx) = attach(&mut hub).await;

    hub.on_client_event(ClientEvent::Message {
        id,
        text: r#"{"type":"send_message","payload":{"chatId":"a@s.whatsapp.net","content":"hi"}}"#
            .into(),
    })
    .await;

    assert!(connector.client.sent.lock().unwrap().is_empty());
    assert_eq!(next_json(&mut rx)["message"], "WhatsApp not connected");
}

#[tokio::test]
async fn test_valid_send_reaches_client() {
    let connector = Arc::new(MockConnector::default());
    let mut hub = hub_with(connector.clone());
    hub.session.start().await.unwrap();
    let (id, mut rx) = attach(&mut hub).await;

    hub.on_client_event(ClientEvent::Message {
        id,
        text: r#"{"type":"send_message","payload":{"chatId":"a@s.whatsapp.net","content":"hi"}}"#
            .into(),
    })
    .await;

    assert_eq!(connector.client.sent.lock().unwrap().len(), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_snapshot_name_reaches_later_messages() {
    let mut hub = hub_with(Arc::new(MockConnector::default()));
    let (_id, mut rx) = attach(&mut hub).await;

    hub.on_session_event(SessionEvent::ChatsSet(vec![ChatSnapshot {
        id: "55119@s.whatsapp.net".into(),
        name: Some("Maria".into()),
        messages: vec![incoming("55119@s.whatsapp.net", "old")],
    }]))
    .await;
    let full = next_json(&mut rx);
    assert_eq!(full["type"], "full_chats");
    assert_eq!(full["data"][0]["sender"]["name"], "Maria");
    assert_eq!(full["data"][0]["messages"][0]["unread"], true);

    hub.on_session_event(SessionEvent::MessagesUpsert(vec![incoming(
        "55119@s.whatsapp.net",
        "new",
    )]))
    .await;
    let fresh = next_json(&mut rx);
    assert_eq!(fresh["type"], "new_messages");
    assert_eq!(fresh["data"][0]["chatId"], "55119@s.whatsapp.net");
    assert_eq!(fresh["data"][0]["message"]["sender"]["name"], "Maria");
    assert_eq!(fresh["data"][0]["message"]["sender"]["username"], "@55119");
}

#[tokio::test]
async fn test_empty_upsert_is_not_broadcast() {
    let mut hub = hub_with(Arc::new(MockConnector::default()));
    let (_id, mut rx) = attach(&mut hub).await;

    hub.on_session_event(SessionEvent::MessagesUpsert(Vec::new()))
        .await;
    hub.on_session_event(SessionEvent::CredsUpdate).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_disconnected_client_is_released() {
    let mut hub = hub_with(Arc::new(MockConnector::default()));
    let (id, _rx) = attach(&mut hub).await;
    assert_eq!(hub.client_count(), 1);

    hub.on_client_event(ClientEvent::Disconnected { id }).await;
    assert_eq!(hub.client_count(), 0);
}

#[tokio::test]
async fn test_connection_updates_are_broadcast() {
    let mut hub = hub_with(Arc::new(MockConnector::default()));
    hub.session.start().await.unwrap();
    let (_id, mut rx) = attach(&mut hub).await;

    hub.on_session_event(SessionEvent::ConnectionUpdate(ConnectionUpdate::qr("2@abc")))
        .await;
    assert_eq!(next_json(&mut rx)["type"], "qr");
    assert_eq!(next_json(&mut rx)["data"], QR_STATUS);

    hub.on_session_event(SessionEvent::ConnectionUpdate(ConnectionUpdate::open()))
        .await;
    assert_eq!(next_json(&mut rx)["data"], CONNECTED_STATUS);
    assert_eq!(hub.session_state(), SessionState::Connected);
}

// --- Live WebSocket ---

async fn next_text<S>(ws: &mut S) -> serde_json::Value
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("transport error");
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_live_socket_round_trip() {
    let connector = Arc::new(MockConnector::default());
    let gateway = Gateway::new(connector, &DisplayConfig::default(), false);
    let session_events = gateway.session_events();

    let (inbox_tx, inbox_rx) = mpsc::channel(64);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(inbox_tx, 16);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let gateway_task = tokio::spawn(gateway.run(inbox_rx));

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    ws.send(tungstenite::Message::Text("garbage".into()))
        .await
        .unwrap();
    let reply = next_text(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], INVALID_FORMAT);

    // The client is registered by now, so a broadcast reaches it.
    session_events
        .send(SessionEvent::MessagesUpsert(vec![incoming(
            "alice@s.whatsapp.net",
            "M1",
        )]))
        .await
        .unwrap();
    let frame = next_text(&mut ws).await;
    assert_eq!(frame["type"], "new_messages");
    assert_eq!(frame["data"][0]["message"]["id"], "M1");
    assert_eq!(frame["data"][0]["message"]["content"], "hello");

    gateway_task.abort();
}
