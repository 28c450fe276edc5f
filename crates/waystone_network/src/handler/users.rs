//! User list synchronisation.

use super::MessageHandler;
use crate::messaging::{Message, MessageType, Payload, TargetKind};
use crate::types::{OnlineUser, User};
use tracing::debug;

impl MessageHandler {
    /// Answers a user list request with this server's online users.
    pub(super) async fn handle_request_user_list(
        &self,
        message: &Message,
        receiver: Option<&OnlineUser>,
    ) {
        let Some(receiver) = receiver else {
            debug!("📭 No local user to answer user list request from {}", message.source_server());
            return;
        };

        let users: Vec<User> = self
            .services
            .users
            .online_users()
            .into_iter()
            .map(|online| online.user)
            .collect();

        self.reply(
            self.outbound(MessageType::UpdateUserList)
                .target(message.source_server(), TargetKind::Server)
                .payload(Payload::user_list(users)),
            Some(receiver),
        )
        .await;
    }

    /// Replaces the cached user list of the sending server.
    pub(super) fn handle_update_user_list(&self, message: &Message) {
        if let Some(users) = message.payload().get_user_list() {
            debug!("👥 {} users online on {}", users.len(), message.source_server());
            self.services
                .users
                .set_user_list(message.source_server(), users.to_vec());
        }
    }
}
