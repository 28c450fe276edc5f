//! Transport seam between servers.
//!
//! The messaging core only ever talks to a [`Broker`]; what actually moves
//! the bytes (a pub/sub bus, a plugin messaging channel, a queue) lives
//! behind it. [`LocalNetwork`] is an in-process implementation used by the
//! node binary and the test suite.

pub mod local;

pub use local::LocalNetwork;

use crate::error::NetworkError;
use crate::messaging::Message;
use crate::types::OnlineUser;
use async_trait::async_trait;

/// Trait for sending messages to other servers - implemented by the transport.
///
/// Delivery guarantees are whatever the transport provides; the core treats
/// a successful `send` as "handed off", never as "delivered".
#[async_trait]
pub trait Broker: Send + Sync + std::fmt::Debug {
    /// Sends `message` through the transport.
    ///
    /// `via` is the local player the message is sent through, when the
    /// transport needs a player connection to carry it.
    async fn send(&self, message: Message, via: Option<&OnlineUser>) -> Result<(), NetworkError>;
}
