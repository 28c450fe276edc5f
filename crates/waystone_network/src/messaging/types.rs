//! Message envelope definitions for server-to-server communication.
//!
//! Every message on the network has the same envelope: an operation code,
//! who sent it, which server it came from, where it is going and one
//! [`Payload`]. Messages are immutable once built.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "id": "5c4f6a1e-3b1d-4c1f-9d56-0a7a3c2f9e10",
//!   "type": "TELEPORT_TO_POSITION",
//!   "sender": "alice",
//!   "source_server": "lobby",
//!   "target": "bob",
//!   "target_type": "PLAYER",
//!   "payload": { "position": { "x": 1.0, "y": 64.0, "z": 2.0, ... } }
//! }
//! ```

use super::payload::Payload;
use crate::broker::Broker;
use crate::error::NetworkError;
use crate::types::OnlineUser;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Target name that addresses every server on the network.
pub const TARGET_ALL: &str = "ALL";

/// Operation codes of the cross-server protocol.
///
/// Names and pairings are part of the wire contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    RequestUserList,
    UpdateUserList,
    TeleportToPosition,
    TeleportToNetworkedPosition,
    TeleportToNetworkedUser,
    TeleportRequest,
    TeleportRequestResponse,
    UpdateHome,
    UpdateWarp,
    RtpRequestLocation,
    RtpLocation,
    ApiRtpRequestLocation,
    ApiRtpLocation,
    UpdateCaches,
}

impl MessageType {
    /// Every operation code, in protocol order.
    pub const ALL: [MessageType; 14] = [
        MessageType::RequestUserList,
        MessageType::UpdateUserList,
        MessageType::TeleportToPosition,
        MessageType::TeleportToNetworkedPosition,
        MessageType::TeleportToNetworkedUser,
        MessageType::TeleportRequest,
        MessageType::TeleportRequestResponse,
        MessageType::UpdateHome,
        MessageType::UpdateWarp,
        MessageType::RtpRequestLocation,
        MessageType::RtpLocation,
        MessageType::ApiRtpRequestLocation,
        MessageType::ApiRtpLocation,
        MessageType::UpdateCaches,
    ];

    /// The wire name of this operation code.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::RequestUserList => "REQUEST_USER_LIST",
            MessageType::UpdateUserList => "UPDATE_USER_LIST",
            MessageType::TeleportToPosition => "TELEPORT_TO_POSITION",
            MessageType::TeleportToNetworkedPosition => "TELEPORT_TO_NETWORKED_POSITION",
            MessageType::TeleportToNetworkedUser => "TELEPORT_TO_NETWORKED_USER",
            MessageType::TeleportRequest => "TELEPORT_REQUEST",
            MessageType::TeleportRequestResponse => "TELEPORT_REQUEST_RESPONSE",
            MessageType::UpdateHome => "UPDATE_HOME",
            MessageType::UpdateWarp => "UPDATE_WARP",
            MessageType::RtpRequestLocation => "RTP_REQUEST_LOCATION",
            MessageType::RtpLocation => "RTP_LOCATION",
            MessageType::ApiRtpRequestLocation => "API_RTP_REQUEST_LOCATION",
            MessageType::ApiRtpLocation => "API_RTP_LOCATION",
            MessageType::UpdateCaches => "UPDATE_CACHES",
        }
    }

    /// Whether the handler for this type needs a local receiving player.
    pub fn requires_receiver(&self) -> bool {
        !matches!(
            self,
            MessageType::UpdateUserList
                | MessageType::RequestUserList
                | MessageType::UpdateHome
                | MessageType::UpdateWarp
                | MessageType::RtpRequestLocation
                | MessageType::ApiRtpRequestLocation
                | MessageType::ApiRtpLocation
                | MessageType::UpdateCaches
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the `target` of a message names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    /// A server name, or [`TARGET_ALL`]
    Server,
    /// A player's username
    Player,
}

/// A message sent from one server of the network to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    #[serde(rename = "type")]
    kind: MessageType,
    #[serde(default)]
    sender: Option<String>,
    source_server: String,
    target: String,
    target_type: TargetKind,
    #[serde(default)]
    payload: Payload,
}

impl Message {
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> MessageType {
        self.kind
    }

    /// Username of the player the message was sent on behalf of, if any.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn source_server(&self) -> &str {
        &self.source_server
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_kind(&self) -> TargetKind {
        self.target_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Whether this message is addressed to every server.
    pub fn is_broadcast(&self) -> bool {
        self.target_type == TargetKind::Server && self.target == TARGET_ALL
    }

    /// Encodes the message to its JSON wire form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, NetworkError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a message from its JSON wire form.
    pub fn from_bytes(data: &[u8]) -> Result<Self, NetworkError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Hands the message to the broker.
    ///
    /// `via` is the local player the message is sent through, for transports
    /// that need one; it may be `None` for server-originated messages.
    pub async fn send(
        self,
        broker: &dyn Broker,
        via: Option<&OnlineUser>,
    ) -> Result<(), NetworkError> {
        broker.send(self, via).await
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {:?}:{}",
            self.kind, self.source_server, self.target_type, self.target
        )
    }
}

/// Builder for [`Message`].
///
/// `kind`, `target` and `source_server` are required; the payload defaults
/// to [`Payload::Empty`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    kind: Option<MessageType>,
    sender: Option<String>,
    source_server: Option<String>,
    target: Option<(String, TargetKind)>,
    payload: Payload,
}

impl MessageBuilder {
    pub fn kind(mut self, kind: MessageType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    pub fn source_server(mut self, server: impl Into<String>) -> Self {
        self.source_server = Some(server.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>, kind: TargetKind) -> Self {
        self.target = Some((target.into(), kind));
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Result<Message, NetworkError> {
        let kind = self.kind.ok_or(NetworkError::IncompleteMessage("type"))?;
        let (target, target_type) = self
            .target
            .ok_or(NetworkError::IncompleteMessage("target"))?;
        let source_server = self
            .source_server
            .ok_or(NetworkError::IncompleteMessage("source server"))?;

        Ok(Message {
            id: Uuid::new_v4(),
            kind,
            sender: self.sender,
            source_server,
            target,
            target_type,
            payload: self.payload,
        })
    }
}
