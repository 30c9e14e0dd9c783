//! Building, running and replacing the WhatsApp bot.

use super::events::translate_event;
use super::forward::EventForwarder;
use super::running::RunningBot;
use super::WhatsAppConnector;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use wabridge_core::{error::BridgeError, event::SessionEvent};
use whatsapp_rust::bot::Bot;
use whatsapp_rust::client::Client;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

impl WhatsAppConnector {
    /// Build a WhatsApp bot that forwards translated events into `events`
    /// and run it in the background.
    ///
    /// A bot left over from a previous call is disconnected and stopped
    /// first, so only one session ever holds the device's socket.
    pub(super) async fn build_and_run_bot(
        &self,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<Client>, BridgeError> {
        if let Some(previous) = self.running.lock().await.take() {
            previous.shutdown().await;
        }
        let forwarder = EventForwarder::new(events, &self.generation);

        let db_path = self.session_db_path();
        info!("WhatsApp bot building (session: {db_path})...");

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| BridgeError::Client(format!("whatsapp store init failed: {e}")))?,
        );

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some(self.config.device_name.clone()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, _client| {
                let forwarder = forwarder.clone();
                async move {
                    if let Some(translated) = translate_event(event) {
                        forwarder.forward(translated).await;
                    }
                }
            })
            .build()
            .await
            .map_err(|e| BridgeError::Client(format!("whatsapp bot build failed: {e}")))?;

        let client = bot.client();

        let task = bot
            .run()
            .await
            .map_err(|e| BridgeError::Client(format!("whatsapp bot run failed: {e}")))?;
        *self.running.lock().await = Some(RunningBot {
            client: client.clone(),
            task,
        });

        info!("WhatsApp bot started");
        Ok(client)
    }
}
