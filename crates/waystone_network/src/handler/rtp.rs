//! Network random teleport resolution.
//!
//! Two flows run here:
//!
//! * **Single player** (`RTP_REQUEST_LOCATION`): one random position in the
//!   requested world is sent back to the requesting player, or an empty
//!   payload if the engine found none.
//! * **API batch** (`API_RTP_REQUEST_LOCATION`): one random anchor is
//!   chosen, `count` candidates are scattered around it, and every
//!   candidate is checked by the safe-location resolver concurrently. The
//!   reply is sent once every check has settled and carries the candidates
//!   that proved safe.
//!
//! Every engine call and safe-location lookup is bounded by the configured
//! timeouts, so a hung collaborator degrades to "no position" instead of
//! leaving the requester without an answer.

use super::MessageHandler;
use crate::messaging::{Message, MessageType, Payload, TargetKind};
use crate::rtp::randomize_around;
use crate::services::{Teleport, TeleportAction};
use crate::types::{Location, OnlineUser, Position, World};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Locale shown to a player whose random teleport found no position.
const RTP_TIMEOUT_LOCALE: &str = "error_rtp_randomization_timeout";

impl MessageHandler {
    /// Resolves one random position and sends it to the requesting player.
    pub(super) async fn handle_rtp_request_location(&self, message: &Message) {
        let Some(requester) = message.sender() else {
            debug!("📭 RTP request from {} has no sender", message.source_server());
            return;
        };

        let world = message
            .payload()
            .get_text()
            .and_then(|name| self.services.worlds.find_world(name));
        let position = self.random_position(world.as_ref()).await;

        self.reply(
            self.outbound(MessageType::RtpLocation)
                .target(requester, TargetKind::Player)
                .payload(Payload::position(position)),
            None,
        )
        .await;
    }

    /// Teleports the receiver to their resolved random position, or tells
    /// them none was found.
    pub(super) async fn handle_rtp_location(&self, message: &Message, receiver: &OnlineUser) {
        let Some(position) = message.payload().get_position() else {
            if let Some(text) = self.services.locales.get_locale(RTP_TIMEOUT_LOCALE) {
                self.services.notifier.send_message(receiver, &text);
            }
            return;
        };

        let teleport = Teleport {
            teleporter: receiver.clone(),
            target: position.clone(),
            actions: vec![TeleportAction::RandomTeleport],
            timed: true,
        };
        if let Err(e) = self.services.teleporter.execute(teleport).await {
            warn!("⚠️ Random teleport of {} failed: {}", receiver.username(), e);
        }
    }

    /// Resolves a batch of safe positions for an API request and sends them
    /// back to the requesting server.
    pub(super) async fn handle_api_rtp_request_location(&self, message: &Message) {
        let request = match message.payload().get_api_rtp_request() {
            Ok(request) => request,
            Err(e) => {
                self.stats.record_malformed();
                warn!(
                    "⚠️ Invalid API RTP location request from {}: {}",
                    message.source_server(),
                    e
                );
                return;
            }
        };
        info!(
            "🎲 Received API RTP location request from {}: {}",
            message.source_server(),
            request
        );

        let max_count = self.config.rtp.max_batch_count;
        let count = if request.count > max_count {
            warn!(
                "⚠️ API RTP request {} asked for {} positions, capping at {}",
                request.request_id, request.count, max_count
            );
            max_count
        } else {
            request.count
        };

        let world = self.services.worlds.find_world(&request.world_name);
        let positions = match self.random_position(world.as_ref()).await {
            Some(anchor) => {
                let positions = self.resolve_safe_positions(&anchor, count).await;
                info!(
                    "🎲 Found {} safe locations for API RTP request {}",
                    positions.len(),
                    request.request_id
                );
                positions
            }
            None => {
                warn!(
                    "⚠️ Failed to get RTP location for API request {}",
                    request.request_id
                );
                Vec::new()
            }
        };

        self.reply(
            self.outbound(MessageType::ApiRtpLocation)
                .target(message.source_server(), TargetKind::Server)
                .payload(Payload::rtp_locations(request.request_id, positions)),
            None,
        )
        .await;
    }

    /// Hands a batch of safe positions to the API request waiting for them.
    pub(super) fn handle_api_rtp_location(&self, message: &Message) {
        let payload = message.payload();
        if let Some((request_id, positions)) = payload.get_rtp_locations() {
            self.rtp_requests.complete(request_id, positions.to_vec());
        } else if let Some(request_id) = payload.get_text() {
            self.rtp_requests.complete(request_id, Vec::new());
        }
    }

    /// Asks the engine for a random position, treating a timeout as none.
    async fn random_position(&self, world: Option<&World>) -> Option<Position> {
        let timeout = self.config.rtp.engine_timeout();
        let lookup = self.services.rtp_engine.random_position(world, &[]);
        match tokio::time::timeout(timeout, lookup).await {
            Ok(position) => position,
            Err(_) => {
                warn!(
                    "⚠️ Random teleport engine timed out after {:?} for world {:?}",
                    timeout,
                    world.map(|w| w.name.as_str())
                );
                None
            }
        }
    }

    /// Scatters `count` candidates around `anchor` and checks all of them
    /// concurrently, keeping the safe ones in candidate order.
    ///
    /// Returns only after every lookup has settled. A lookup that times out
    /// or whose task fails is left out of the result.
    async fn resolve_safe_positions(&self, anchor: &Position, count: usize) -> Vec<Position> {
        let timeout = self.config.rtp.safe_location_timeout();
        let mut lookups = JoinSet::new();

        for index in 0..count {
            let candidate = randomize_around(anchor);
            let resolver = Arc::clone(&self.services.safe_locations);
            lookups.spawn(async move {
                let lookup = resolver.find_safe_ground_location(&candidate);
                let found = tokio::time::timeout(timeout, lookup)
                    .await
                    .unwrap_or_else(|_| {
                        debug!("⏱️ Safe location lookup {} timed out", index);
                        None
                    });
                (index, found)
            });
        }

        let mut resolved: Vec<Option<Location>> = vec![None; count];
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, found)) => resolved[index] = found,
                Err(e) => warn!("⚠️ Safe location lookup failed: {}", e),
            }
        }

        resolved
            .into_iter()
            .flatten()
            .map(|location| Position::from_location(location, self.server_name()))
            .collect()
    }
}
