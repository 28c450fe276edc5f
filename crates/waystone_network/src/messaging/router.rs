//! Inbound routing from the transport to the dispatch core.
//!
//! Transports may deliver a message to more servers than it is meant for
//! (a pub/sub bus delivers everything everywhere). Routing filters those
//! out and picks the local receiver before dispatch.
//!
//! # Delivery rules
//!
//! * `SERVER` targets are accepted when they name this server or
//!   [`TARGET_ALL`]; the receiver is any locally online player, if one is.
//! * `PLAYER` targets are accepted only when that player is online here,
//!   and that player is the receiver.

use crate::error::NetworkError;
use crate::handler::MessageHandler;
use crate::messaging::{Message, TargetKind, TARGET_ALL};
use tracing::trace;

/// Routes a decoded message to `handler` if it is addressed to its server.
///
/// Returns whether the message was accepted and dispatched.
pub async fn route_message(message: Message, handler: &MessageHandler) -> bool {
    let users = &handler.services().users;

    let receiver = match message.target_kind() {
        TargetKind::Server => {
            if message.target() != TARGET_ALL && message.target() != handler.server_name() {
                trace!("🔀 {} is not for {}", message, handler.server_name());
                return false;
            }
            users.online_users().into_iter().next()
        }
        TargetKind::Player => match users.find_online_user(message.target()) {
            Some(receiver) => Some(receiver),
            None => {
                trace!("🔀 {} is not online on {}", message.target(), handler.server_name());
                return false;
            }
        },
    };

    handler.handle(message, receiver).await;
    true
}

/// Decodes a raw wire message and routes it to `handler`.
///
/// Decode failures are returned so the transport loop can log them; they
/// never affect the handling of later messages.
pub async fn route_raw(data: &[u8], handler: &MessageHandler) -> Result<bool, NetworkError> {
    let message = Message::from_bytes(data)?;
    Ok(route_message(message, handler).await)
}
