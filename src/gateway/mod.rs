//! Gateway: the single event loop joining the WhatsApp session and the
//! WebSocket clients.
//!
//! All mutable state (profile cache, connection set, session handle) lives in
//! [`Hub`] and is only touched from [`Gateway::run`], one event at a time.
//! Socket tasks and the external client talk to it through `mpsc` queues.

mod broadcast;
mod server;
mod session;

#[cfg(test)]
mod tests;

pub use broadcast::Broadcaster;
pub use server::{router, ClientEvent};
pub use session::{Session, SessionState};

use crate::transform::{transform_chats_snapshot, transform_messages_upsert};
use crate::users::UserCache;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use wabridge_channels::whatsapp::generate_qr_terminal;
use wabridge_core::{
    config::DisplayConfig,
    event::{ConnectionUpdate, SessionEvent},
    message::{ClientCommand, Envelope, InboundCommand},
    traits::Connector,
};

/// Error text returned to a client whose frame could not be parsed.
pub const INVALID_FORMAT: &str = "Invalid message format";

/// Capacity of the session event queue.
const SESSION_QUEUE: usize = 256;

/// Owns every piece of mutable bridge state.
pub struct Hub {
    session: Session,
    clients: Broadcaster,
    users: UserCache,
    language: String,
    print_qr: bool,
}

impl Hub {
    pub fn new(session: Session, users: UserCache, language: &str, print_qr: bool) -> Self {
        Self {
            session,
            clients: Broadcaster::new(),
            users,
            language: language.to_string(),
            print_qr,
        }
    }

    #[cfg(test)]
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Handle one event from the WhatsApp session.
    pub async fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ConnectionUpdate(update) => self.on_connection_update(update).await,
            SessionEvent::ChatsSet(chats) => {
                info!("received chat snapshot with {} chats", chats.len());
                let data = transform_chats_snapshot(&chats, &mut self.users, &self.language);
                self.clients.broadcast(&Envelope::FullChats { data });
            }
            SessionEvent::MessagesUpsert(messages) => {
                info!("received {} new messages", messages.len());
                let data = transform_messages_upsert(&messages, &mut self.users, &self.language);
                if !data.is_empty() {
                    self.clients.broadcast(&Envelope::NewMessages { data });
                }
            }
            SessionEvent::CredsUpdate => {
                info!("WhatsApp credentials updated");
            }
        }
    }

    async fn on_connection_update(&mut self, update: ConnectionUpdate) {
        if self.print_qr {
            if let Some(qr) = &update.qr {
                match generate_qr_terminal(qr) {
                    Ok(rendered) => println!("\n{rendered}"),
                    Err(e) => warn!("failed to render QR code: {e}"),
                }
            }
        }
        for envelope in self.session.on_connection_update(update).await {
            self.clients.broadcast(&envelope);
        }
        debug!("session state is now {:?}", self.session.state());
    }

    /// Handle one event from a WebSocket connection.
    pub async fn on_client_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Connected { id, tx } => {
                self.clients.add(id, tx);
                info!("{} client(s) connected", self.clients.len());
            }
            ClientEvent::Message { id, text } => self.on_client_message(id, &text).await,
            ClientEvent::Disconnected { id } => {
                self.clients.remove(&id);
                info!("{} client(s) connected", self.clients.len());
            }
        }
    }

    async fn on_client_message(&mut self, id: Uuid, raw: &str) {
        let command = match InboundCommand::parse(raw) {
            Ok(c) => c,
            Err(e) => {
                warn!("invalid frame from client {id}: {e}");
                self.clients.send_to(&id, &Envelope::error(INVALID_FORMAT));
                return;
            }
        };

        match command {
            ClientCommand::SendMessage(payload) => {
                let chat_id = payload.chat_id.filter(|s| !s.is_empty());
                let content = payload.content.filter(|s| !s.is_empty());
                let (Some(chat_id), Some(content)) = (chat_id, content) else {
                    warn!("send_message from client {id} is missing chatId or content");
                    return;
                };
                if let Err(e) = self.session.send_message(&chat_id, &content).await {
                    error!("send_message to {chat_id} failed: {e}");
                    self.clients.send_to(&id, &Envelope::error(e.to_string()));
                }
            }
            ClientCommand::Unknown(kind) => {
                info!("ignoring command of type '{kind}' from client {id}");
            }
        }
    }
}

/// The bridge event loop.
pub struct Gateway {
    hub: Hub,
    session_tx: mpsc::Sender<SessionEvent>,
    session_rx: mpsc::Receiver<SessionEvent>,
}

impl Gateway {
    pub fn new(connector: Arc<dyn Connector>, display: &DisplayConfig, print_qr: bool) -> Self {
        let (session_tx, session_rx) = mpsc::channel(SESSION_QUEUE);
        let session = Session::new(connector, session_tx.clone());
        let users = UserCache::new(display.synthesize_profiles);
        Self {
            hub: Hub::new(session, users, &display.language, print_qr),
            session_tx,
            session_rx,
        }
    }

    /// Sender feeding the session event queue.
    #[cfg(test)]
    pub fn session_events(&self) -> mpsc::Sender<SessionEvent> {
        self.session_tx.clone()
    }

    /// Start the WhatsApp session, then process events until Ctrl-C.
    pub async fn run(self, mut inbox: mpsc::Receiver<ClientEvent>) -> anyhow::Result<()> {
        let Self {
            mut hub,
            session_tx,
            mut session_rx,
        } = self;
        drop(session_tx);

        hub.session
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start WhatsApp session: {e}"))?;
        info!("wabridge gateway running");

        loop {
            tokio::select! {
                Some(event) = session_rx.recv() => hub.on_session_event(event).await,
                Some(event) = inbox.recv() => hub.on_client_event(event).await,
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("wabridge gateway stopped");
        Ok(())
    }
}
