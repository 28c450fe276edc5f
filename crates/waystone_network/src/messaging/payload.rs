//! Message payloads.
//!
//! In memory a payload is a sum type with one variant per data shape, so a
//! handler can only read the shape it matched on. On the wire it keeps the
//! optional-field object every server on the network already speaks:
//!
//! ```json
//! { "string": "req-42", "position_list": [ ... ] }
//! ```
//!
//! Conversion between the two happens in the serde `from`/`into` hooks.

use crate::error::PayloadError;
use crate::types::{Position, TeleportRequest, User};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field separator of the API RTP request string.
const API_RTP_SEPARATOR: char = '\0';

/// The data carried by one message.
///
/// Every message has exactly one payload; [`Payload::Empty`] is the default
/// for message types that carry nothing (e.g. `UPDATE_CACHES`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "WirePayload", into = "WirePayload")]
pub enum Payload {
    #[default]
    Empty,
    /// A single position
    Position(Position),
    /// A list of positions
    PositionList(Vec<Position>),
    /// An opaque string (player name, world name, home/warp id)
    Text(String),
    /// A snapshot of the users online on a server
    UserList(Vec<User>),
    /// A player-to-player teleport request
    TeleportRequest(TeleportRequest),
    /// A batch random-teleport request from the API
    ApiRtpRequest(ApiRtpRequest),
    /// Safe positions answering an [`ApiRtpRequest`]
    RtpLocations {
        request_id: String,
        positions: Vec<Position>,
    },
}

impl Payload {
    /// A position payload; `None` yields an empty payload.
    pub fn position(position: Option<Position>) -> Self {
        position.map_or(Self::Empty, Self::Position)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn user_list(users: Vec<User>) -> Self {
        Self::UserList(users)
    }

    pub fn rtp_locations(request_id: impl Into<String>, positions: Vec<Position>) -> Self {
        Self::RtpLocations {
            request_id: request_id.into(),
            positions,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn get_position(&self) -> Option<&Position> {
        match self {
            Self::Position(position) => Some(position),
            _ => None,
        }
    }

    pub fn get_position_list(&self) -> Option<&[Position]> {
        match self {
            Self::PositionList(positions) => Some(positions),
            Self::RtpLocations { positions, .. } => Some(positions),
            _ => None,
        }
    }

    pub fn get_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn get_user_list(&self) -> Option<&[User]> {
        match self {
            Self::UserList(users) => Some(users),
            _ => None,
        }
    }

    pub fn get_teleport_request(&self) -> Option<&TeleportRequest> {
        match self {
            Self::TeleportRequest(request) => Some(request),
            _ => None,
        }
    }

    /// The request id and positions of an RTP locations reply.
    pub fn get_rtp_locations(&self) -> Option<(&str, &[Position])> {
        match self {
            Self::RtpLocations {
                request_id,
                positions,
            } => Some((request_id, positions)),
            _ => None,
        }
    }

    /// Reads an API RTP request.
    ///
    /// Requests arriving from the wire are still in their string form and
    /// are parsed here; anything else is reported as a payload error.
    pub fn get_api_rtp_request(&self) -> Result<ApiRtpRequest, PayloadError> {
        match self {
            Self::ApiRtpRequest(request) => Ok(request.clone()),
            Self::Text(raw) => raw.parse(),
            _ => Err(PayloadError::Missing("API RTP request")),
        }
    }
}

/// A request for `count` safe positions in `world_name` near one random
/// anchor.
///
/// Encoded on the wire as `requestId\0count\0worldName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRtpRequest {
    pub request_id: String,
    pub count: usize,
    pub world_name: String,
}

impl ApiRtpRequest {
    pub fn new(request_id: impl Into<String>, count: usize, world_name: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            count,
            world_name: world_name.into(),
        }
    }

    /// The NUL-delimited wire string.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.request_id,
            self.count,
            self.world_name,
            sep = API_RTP_SEPARATOR
        )
    }
}

impl fmt::Display for ApiRtpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{} in {}",
            self.request_id, self.count, self.world_name
        )
    }
}

impl FromStr for ApiRtpRequest {
    type Err = PayloadError;

    /// Parses the wire string.
    ///
    /// Trailing empty fields are discarded before the field count is
    /// checked, so `"id\03\0world\0"` is accepted and `"id\03\0"` is not.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = raw.split(API_RTP_SEPARATOR).collect();
        while parts.last().is_some_and(|part| part.is_empty()) {
            parts.pop();
        }

        let &[request_id, count, world_name] = parts.as_slice() else {
            return Err(PayloadError::FieldCount {
                found: parts.len(),
                raw: raw.to_string(),
            });
        };

        let count = count
            .parse::<usize>()
            .map_err(|_| PayloadError::InvalidCount(count.to_string()))?;

        Ok(Self::new(request_id, count, world_name))
    }
}

/// The optional-field payload object used on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WirePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position_list: Option<Vec<Position>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_list: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    teleport_request: Option<TeleportRequest>,
}

impl From<Payload> for WirePayload {
    fn from(payload: Payload) -> Self {
        let mut wire = WirePayload::default();
        match payload {
            Payload::Empty => {}
            Payload::Position(position) => wire.position = Some(position),
            Payload::PositionList(positions) => wire.position_list = Some(positions),
            Payload::Text(text) => wire.string = Some(text),
            Payload::UserList(users) => wire.user_list = Some(users),
            Payload::TeleportRequest(request) => wire.teleport_request = Some(request),
            Payload::ApiRtpRequest(request) => wire.string = Some(request.encode()),
            Payload::RtpLocations {
                request_id,
                positions,
            } => {
                wire.string = Some(request_id);
                wire.position_list = Some(positions);
            }
        }
        wire
    }
}

impl From<WirePayload> for Payload {
    fn from(wire: WirePayload) -> Self {
        if let Some(request) = wire.teleport_request {
            return Payload::TeleportRequest(request);
        }
        if let Some(users) = wire.user_list {
            return Payload::UserList(users);
        }
        match (wire.string, wire.position_list, wire.position) {
            (Some(request_id), Some(positions), _) => Payload::RtpLocations {
                request_id,
                positions,
            },
            (None, Some(positions), _) => Payload::PositionList(positions),
            (_, None, Some(position)) => Payload::Position(position),
            (Some(text), None, None) => Payload::Text(text),
            (None, None, None) => Payload::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::World;
    use uuid::Uuid;

    fn position() -> Position {
        Position::at(
            100.0,
            64.0,
            100.0,
            World::new("world_nether", Uuid::nil()),
            "survival",
        )
    }

    #[test]
    fn test_accessors_return_none_for_other_shapes() {
        let payload = Payload::text("alice");
        assert_eq!(payload.get_text(), Some("alice"));
        assert!(payload.get_position().is_none());
        assert!(payload.get_position_list().is_none());
        assert!(payload.get_user_list().is_none());
        assert!(payload.get_teleport_request().is_none());

        assert!(Payload::Empty.get_text().is_none());
        assert!(Payload::position(None).is_empty());
    }

    #[test]
    fn test_parse_api_rtp_request() {
        let request: ApiRtpRequest = "req-42\u{0}3\u{0}world_nether"
            .parse()
            .expect("well-formed request should parse");
        assert_eq!(request, ApiRtpRequest::new("req-42", 3, "world_nether"));
        assert_eq!(request.encode(), "req-42\u{0}3\u{0}world_nether");
    }

    #[test]
    fn test_parse_api_rtp_request_rejects_malformed_input() {
        assert_eq!(
            "onlyonefield".parse::<ApiRtpRequest>(),
            Err(PayloadError::FieldCount {
                found: 1,
                raw: "onlyonefield".to_string()
            })
        );
        assert_eq!(
            "abc\u{0}notanumber\u{0}world".parse::<ApiRtpRequest>(),
            Err(PayloadError::InvalidCount("notanumber".to_string()))
        );
        assert_eq!(
            "abc\u{0}-1\u{0}world".parse::<ApiRtpRequest>(),
            Err(PayloadError::InvalidCount("-1".to_string()))
        );
        assert!("a\u{0}1\u{0}b\u{0}c".parse::<ApiRtpRequest>().is_err());
    }

    #[test]
    fn test_parse_api_rtp_request_trailing_fields() {
        assert!("id\u{0}3\u{0}world\u{0}".parse::<ApiRtpRequest>().is_ok());
        assert!(matches!(
            "id\u{0}3\u{0}".parse::<ApiRtpRequest>(),
            Err(PayloadError::FieldCount { found: 2, .. })
        ));
        assert!(matches!(
            "".parse::<ApiRtpRequest>(),
            Err(PayloadError::FieldCount { found: 0, .. })
        ));
    }

    #[test]
    fn test_api_rtp_request_travels_as_string() {
        let payload = Payload::ApiRtpRequest(ApiRtpRequest::new("req-1", 2, "world"));
        let json = serde_json::to_value(&payload).expect("payload should serialize");
        assert_eq!(json, serde_json::json!({ "string": "req-1\u{0}2\u{0}world" }));

        let decoded: Payload = serde_json::from_value(json).expect("payload should deserialize");
        assert_eq!(decoded, Payload::text("req-1\u{0}2\u{0}world"));
        assert_eq!(
            decoded.get_api_rtp_request(),
            Ok(ApiRtpRequest::new("req-1", 2, "world"))
        );
    }

    #[test]
    fn test_rtp_locations_wire_shape() {
        let payload = Payload::rtp_locations("req-42", vec![position()]);
        let json = serde_json::to_value(&payload).expect("payload should serialize");
        assert_eq!(json["string"], "req-42");
        assert_eq!(json["position_list"].as_array().map(Vec::len), Some(1));

        let decoded: Payload = serde_json::from_value(json).expect("payload should deserialize");
        let (request_id, positions) = decoded
            .get_rtp_locations()
            .expect("string + position_list should decode as RTP locations");
        assert_eq!(request_id, "req-42");
        assert_eq!(positions, &[position()]);
    }

    #[test]
    fn test_empty_wire_payload_decodes_to_empty() {
        let decoded: Payload = serde_json::from_str("{}").expect("empty object should decode");
        assert_eq!(decoded, Payload::Empty);
        assert_eq!(serde_json::to_string(&Payload::Empty).ok().as_deref(), Some("{}"));
    }
}
