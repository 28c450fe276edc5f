//! Requester-side operations: the outbound half of each protocol pair.

use super::MessageHandler;
use crate::error::NetworkError;
use crate::messaging::{ApiRtpRequest, MessageType, Payload, TargetKind, TARGET_ALL};
use crate::types::{OnlineUser, Position, TeleportRequest};
use tracing::info;
use uuid::Uuid;

impl MessageHandler {
    /// Asks every other server for its online users.
    pub async fn request_user_lists(&self, via: Option<&OnlineUser>) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::RequestUserList)
                .target(TARGET_ALL, TargetKind::Server),
            via,
        )
        .await
    }

    /// Tells every other server that a home changed.
    pub async fn broadcast_home_update(&self, id: Uuid) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::UpdateHome)
                .target(TARGET_ALL, TargetKind::Server)
                .payload(Payload::text(id.to_string())),
            None,
        )
        .await
    }

    /// Tells every other server that a warp changed.
    pub async fn broadcast_warp_update(&self, id: Uuid) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::UpdateWarp)
                .target(TARGET_ALL, TargetKind::Server)
                .payload(Payload::text(id.to_string())),
            None,
        )
        .await
    }

    /// Asks every other server to reload its public home and warp caches.
    pub async fn broadcast_cache_refresh(&self) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::UpdateCaches)
                .target(TARGET_ALL, TargetKind::Server),
            None,
        )
        .await
    }

    /// Starts teleporting a local player to a player on another server.
    ///
    /// The target's server answers with `TELEPORT_TO_POSITION`.
    pub async fn teleport_to_networked_player(
        &self,
        teleporter: &OnlineUser,
        target_name: &str,
    ) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::TeleportToNetworkedPosition)
                .target(target_name, TargetKind::Player),
            Some(teleporter),
        )
        .await
    }

    /// Teleports `player`, wherever they are, to `target_name`, wherever
    /// they are.
    pub async fn teleport_player_to_player(
        &self,
        via: Option<&OnlineUser>,
        player: &str,
        target_name: &str,
    ) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::TeleportToNetworkedUser)
                .target(player, TargetKind::Player)
                .payload(Payload::text(target_name)),
            via,
        )
        .await
    }

    /// Delivers a teleport request to a player on another server.
    pub async fn send_teleport_request(
        &self,
        requester: &OnlineUser,
        request: TeleportRequest,
        recipient_name: &str,
    ) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::TeleportRequest)
                .target(recipient_name, TargetKind::Player)
                .payload(Payload::TeleportRequest(request)),
            Some(requester),
        )
        .await
    }

    /// Sends a recipient's answer back to the original requester.
    pub async fn send_teleport_request_response(
        &self,
        recipient: &OnlineUser,
        request: TeleportRequest,
    ) -> Result<(), NetworkError> {
        let requester = request.requester_name.clone();
        self.send(
            self.outbound(MessageType::TeleportRequestResponse)
                .target(requester, TargetKind::Player)
                .payload(Payload::TeleportRequest(request)),
            Some(recipient),
        )
        .await
    }

    /// Asks `server` for a random position in `world_name` for `player`.
    ///
    /// The answer arrives as `RTP_LOCATION` addressed to the player.
    pub async fn request_remote_rtp(
        &self,
        player: &OnlineUser,
        server: &str,
        world_name: &str,
    ) -> Result<(), NetworkError> {
        self.send(
            self.outbound(MessageType::RtpRequestLocation)
                .target(server, TargetKind::Server)
                .payload(Payload::text(world_name)),
            Some(player),
        )
        .await
    }

    /// Asks `server` for up to `count` safe positions in `world_name` and
    /// waits for the answer.
    ///
    /// Fails with [`NetworkError::Timeout`] if no answer arrives within the
    /// configured API request timeout.
    pub async fn request_api_rtp(
        &self,
        server: &str,
        world_name: &str,
        count: usize,
    ) -> Result<Vec<Position>, NetworkError> {
        let pending = self.rtp_requests.register();
        let request = ApiRtpRequest::new(pending.request_id(), count, world_name);
        info!("🎲 Requesting {} from {}", request, server);

        let sent = self
            .send(
                self.outbound(MessageType::ApiRtpRequestLocation)
                    .target(server, TargetKind::Server)
                    .payload(Payload::ApiRtpRequest(request)),
                None,
            )
            .await;
        if let Err(e) = sent {
            self.rtp_requests.cancel(pending.request_id());
            return Err(e);
        }

        pending
            .wait(&self.rtp_requests, self.config.rtp.api_request_timeout())
            .await
    }
}
