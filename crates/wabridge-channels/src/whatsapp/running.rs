//! A bot that is currently running, and how to stop it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use whatsapp_rust::client::Client;

/// Something whose connection can be closed on purpose.
#[async_trait]
pub(super) trait Disconnect: Send + Sync {
    async fn disconnect(&self);
}

#[async_trait]
impl Disconnect for Client {
    async fn disconnect(&self) {
        Client::disconnect(self).await;
    }
}

/// Client handle plus the task driving it.
pub(super) struct RunningBot<C: Disconnect + ?Sized = Client> {
    pub(super) client: Arc<C>,
    pub(super) task: JoinHandle<()>,
}

impl<C: Disconnect + ?Sized> RunningBot<C> {
    /// Close the client's socket, then stop its task. An aborted task alone
    /// leaves the client's own reconnect loop running.
    pub(super) async fn shutdown(self) {
        info!("disconnecting previous WhatsApp client");
        self.client.disconnect().await;
        self.task.abort();
    }
}
