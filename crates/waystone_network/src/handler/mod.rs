//! The dispatch core.
//!
//! [`MessageHandler`] maps every inbound [`Message`] to exactly one handler
//! by its [`MessageType`]. Handlers read the payload, perform a local effect
//! and/or send replies through the broker. They never fail outward: a
//! missing or malformed payload is a logged no-op, an unanswerable request
//! is dropped, and an empty asynchronous result travels back as an empty
//! payload.
//!
//! Handlers are `async` and are driven by the transport, which spawns one
//! task per inbound message. Nothing here blocks a thread while waiting on
//! the random-teleport engine or the safe-location resolver.

mod cache;
mod outbound;
mod rtp;
mod teleport;
mod users;

use crate::config::NetworkConfig;
use crate::error::NetworkError;
use crate::messaging::{Message, MessageBuilder, MessageType};
use crate::rtp::RtpRequestTracker;
use crate::services::NetworkServices;
use crate::stats::HandlerStats;
use crate::types::OnlineUser;
use tracing::{debug, error, trace};

/// Handles inbound messages for one server and sends its outbound ones.
#[derive(Debug)]
pub struct MessageHandler {
    config: NetworkConfig,
    services: NetworkServices,
    rtp_requests: RtpRequestTracker,
    stats: HandlerStats,
}

impl MessageHandler {
    /// Creates a handler for the server described by `config`.
    pub fn new(config: NetworkConfig, services: NetworkServices) -> Result<Self, NetworkError> {
        config.validate()?;
        Ok(Self {
            config,
            services,
            rtp_requests: RtpRequestTracker::new(),
            stats: HandlerStats::default(),
        })
    }

    pub fn server_name(&self) -> &str {
        &self.config.server_name
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn services(&self) -> &NetworkServices {
        &self.services
    }

    pub fn stats(&self) -> &HandlerStats {
        &self.stats
    }

    /// Outstanding API RTP requests sent from this server.
    pub fn rtp_requests(&self) -> &RtpRequestTracker {
        &self.rtp_requests
    }

    /// Dispatches one inbound message.
    ///
    /// `receiver` is the local player the message was delivered to (or any
    /// local player, for server-targeted messages). Types that act on a
    /// player are skipped when there is none.
    pub async fn handle(&self, message: Message, receiver: Option<OnlineUser>) {
        self.stats.record_handled();
        trace!("📨 Handling {} ({})", message, message.id());

        let kind = message.kind();
        let receiver = match receiver {
            Some(receiver) => Some(receiver),
            None if kind.requires_receiver() => {
                debug!("📭 Dropping {} with no local receiver", kind);
                return;
            }
            None => None,
        };

        match (kind, receiver.as_ref()) {
            (MessageType::RequestUserList, receiver) => {
                self.handle_request_user_list(&message, receiver).await
            }
            (MessageType::UpdateUserList, _) => self.handle_update_user_list(&message),
            (MessageType::TeleportToPosition, Some(receiver)) => {
                self.handle_teleport_to_position(&message, receiver).await
            }
            (MessageType::TeleportToNetworkedPosition, Some(receiver)) => {
                self.handle_teleport_to_networked_position(&message, receiver)
                    .await
            }
            (MessageType::TeleportToNetworkedUser, Some(receiver)) => {
                self.handle_teleport_to_networked_user(&message, receiver)
                    .await
            }
            (MessageType::TeleportRequest, Some(receiver)) => {
                self.handle_teleport_request(&message, receiver)
            }
            (MessageType::TeleportRequestResponse, Some(receiver)) => {
                self.handle_teleport_request_response(&message, receiver)
            }
            (MessageType::UpdateHome, _) => self.handle_update_home(&message),
            (MessageType::UpdateWarp, _) => self.handle_update_warp(&message),
            (MessageType::RtpRequestLocation, _) => {
                self.handle_rtp_request_location(&message).await
            }
            (MessageType::RtpLocation, Some(receiver)) => {
                self.handle_rtp_location(&message, receiver).await
            }
            (MessageType::ApiRtpRequestLocation, _) => {
                self.handle_api_rtp_request_location(&message).await
            }
            (MessageType::ApiRtpLocation, _) => self.handle_api_rtp_location(&message),
            (MessageType::UpdateCaches, _) => self.handle_update_caches(),
            (
                MessageType::TeleportToPosition
                | MessageType::TeleportToNetworkedPosition
                | MessageType::TeleportToNetworkedUser
                | MessageType::TeleportRequest
                | MessageType::TeleportRequestResponse
                | MessageType::RtpLocation,
                None,
            ) => debug!("📭 Dropping {} with no local receiver", kind),
        }
    }

    /// A builder for an outbound message of `kind` from this server.
    fn outbound(&self, kind: MessageType) -> MessageBuilder {
        Message::builder()
            .kind(kind)
            .source_server(self.server_name())
    }

    /// Stamps and sends an outbound message through the broker.
    async fn send(
        &self,
        builder: MessageBuilder,
        via: Option<&OnlineUser>,
    ) -> Result<(), NetworkError> {
        let message = builder
            .sender(via.map(|user| user.username().to_string()))
            .build()?;
        trace!("📤 Sending {}", message);

        match message.send(self.services.broker.as_ref(), via).await {
            Ok(()) => {
                self.stats.record_sent();
                Ok(())
            }
            Err(e) => {
                self.stats.record_send_failure();
                Err(e)
            }
        }
    }

    /// Sends a reply, logging instead of returning failures.
    async fn reply(&self, builder: MessageBuilder, via: Option<&OnlineUser>) {
        if let Err(e) = self.send(builder, via).await {
            error!("❌ Failed to send reply from {}: {}", self.server_name(), e);
        }
    }
}
