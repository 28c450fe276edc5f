//! Message handling and routing for server-to-server communication.
//!
//! This module provides the envelope and payload model shared by every
//! server, and the routing step that decides whether an inbound message is
//! for this server and which local player receives it.

pub mod payload;
pub mod router;
pub mod types;

pub use payload::{ApiRtpRequest, Payload};
pub use router::{route_message, route_raw};
pub use types::{Message, MessageBuilder, MessageType, TargetKind, TARGET_ALL};
