//! Cross-server teleports and player-to-player teleport requests.

use super::MessageHandler;
use crate::messaging::{Message, MessageType, Payload, TargetKind};
use crate::services::Teleport;
use crate::types::OnlineUser;
use tracing::{debug, warn};

impl MessageHandler {
    /// Teleports the receiver to the position in the payload.
    pub(super) async fn handle_teleport_to_position(
        &self,
        message: &Message,
        receiver: &OnlineUser,
    ) {
        let Some(position) = message.payload().get_position() else {
            return;
        };

        let teleport = Teleport::immediate(receiver.clone(), position.clone());
        if let Err(e) = self.services.teleporter.execute(teleport).await {
            warn!("⚠️ Teleport of {} failed: {}", receiver.username(), e);
        }
    }

    /// Answers "where is this player" with the receiver's current position,
    /// addressed to the player who asked.
    pub(super) async fn handle_teleport_to_networked_position(
        &self,
        message: &Message,
        receiver: &OnlineUser,
    ) {
        let Some(sender) = message.sender() else {
            debug!("📭 Position request for {} has no sender", receiver.username());
            return;
        };

        self.reply(
            self.outbound(MessageType::TeleportToPosition)
                .target(sender, TargetKind::Player)
                .payload(Payload::position(Some(receiver.position.clone()))),
            Some(receiver),
        )
        .await;
    }

    /// Forwards a position request for the receiver to wherever the named
    /// target player is.
    pub(super) async fn handle_teleport_to_networked_user(
        &self,
        message: &Message,
        receiver: &OnlineUser,
    ) {
        let Some(target) = message.payload().get_text() else {
            return;
        };

        self.reply(
            self.outbound(MessageType::TeleportToNetworkedPosition)
                .target(target, TargetKind::Player),
            Some(receiver),
        )
        .await;
    }

    pub(super) fn handle_teleport_request(&self, message: &Message, receiver: &OnlineUser) {
        if let Some(request) = message.payload().get_teleport_request() {
            self.services
                .requests
                .send_local_teleport_request(request.clone(), receiver);
        }
    }

    pub(super) fn handle_teleport_request_response(
        &self,
        message: &Message,
        receiver: &OnlineUser,
    ) {
        if let Some(request) = message.payload().get_teleport_request() {
            self.services
                .requests
                .handle_local_request_response(receiver, request.clone());
        }
    }
}
