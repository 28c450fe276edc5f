//! In-process transport connecting several servers' handlers.
//!
//! Every attached server gets an unbounded inbox of encoded messages and an
//! inbox task. The inbox task spawns one task per message, so a slow
//! handler (an RTP batch waiting on its lookups) never holds up delivery of
//! the next message.

use super::Broker;
use crate::error::NetworkError;
use crate::handler::MessageHandler;
use crate::messaging::{route_raw, Message, TargetKind};
use crate::types::OnlineUser;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Inbox = mpsc::UnboundedSender<Vec<u8>>;

/// A network of servers living in one process.
///
/// # Fan-out
///
/// * `SERVER` + [`TARGET_ALL`](crate::messaging::TARGET_ALL) → every server
///   except the source
/// * `SERVER` + name → that server, if attached
/// * `PLAYER` → every server; routing keeps it only where the player is
#[derive(Debug, Default)]
pub struct LocalNetwork {
    routes: DashMap<String, Inbox>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attaches a server's handler and starts its inbox task.
    ///
    /// Attaching a second handler under the same server name replaces the
    /// first; its inbox task ends once its queue drains.
    pub fn attach(&self, handler: Arc<MessageHandler>) -> JoinHandle<()> {
        let (inbox, mut queue) = mpsc::unbounded_channel::<Vec<u8>>();
        let server = handler.server_name().to_string();
        if self.routes.insert(server.clone(), inbox).is_some() {
            warn!("🔁 Replacing existing handler for {}", server);
        }
        info!("🔗 {} joined the local network", server);

        tokio::spawn(async move {
            while let Some(data) = queue.recv().await {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    if let Err(e) = route_raw(&data, &handler).await {
                        let server = handler.server_name();
                        warn!("❌ Dropping undecodable message on {}: {}", server, e);
                    }
                });
            }
            debug!("🔌 Inbox of {} closed", server);
        })
    }

    /// Names of all attached servers.
    pub fn servers(&self) -> Vec<String> {
        let mut servers: Vec<String> =
            self.routes.iter().map(|route| route.key().clone()).collect();
        servers.sort();
        servers
    }

    /// Detaches every server, ending all inbox tasks.
    pub fn shutdown(&self) {
        self.routes.clear();
        info!("🛑 Local network shut down");
    }

    fn recipients(&self, message: &Message) -> Vec<(String, Inbox)> {
        let everyone = || {
            self.routes
                .iter()
                .map(|route| (route.key().clone(), route.value().clone()))
        };

        match message.target_kind() {
            TargetKind::Server if message.is_broadcast() => everyone()
                .filter(|(server, _)| server != message.source_server())
                .collect(),
            TargetKind::Server => self
                .routes
                .get(message.target())
                .map(|route| vec![(route.key().clone(), route.value().clone())])
                .unwrap_or_default(),
            TargetKind::Player => everyone().collect(),
        }
    }
}

#[async_trait]
impl Broker for LocalNetwork {
    /// Delivers to every recipient whose inbox is open, then reports the
    /// closed ones as a single error.
    async fn send(&self, message: Message, _via: Option<&OnlineUser>) -> Result<(), NetworkError> {
        let data = message.to_bytes()?;
        let recipients = self.recipients(&message);
        if recipients.is_empty() {
            debug!("📭 No server on the local network for {}", message);
            return Ok(());
        }

        let closed: Vec<String> = recipients
            .into_iter()
            .filter_map(|(server, inbox)| inbox.send(data.clone()).err().map(|_| server))
            .collect();
        if closed.is_empty() {
            return Ok(());
        }

        warn!("📪 {} not delivered to closed inboxes: {}", message, closed.join(", "));
        Err(NetworkError::Broker(format!(
            "inbox of {} is closed",
            closed.join(", ")
        )))
    }
}
