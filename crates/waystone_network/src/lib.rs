//! # Waystone Network
//!
//! The cross-server messaging core of a multi-server teleport network.
//! Servers exchange typed messages through a broker to keep user lists and
//! home/warp caches in sync, teleport players across servers and resolve
//! random-teleport positions on the server that hosts the target world.
//!
//! ## Core Pieces
//!
//! - **Messages** ([`Message`], [`Payload`]): an immutable envelope with one
//!   of 14 operation codes and a typed payload
//! - **Dispatch** ([`MessageHandler`]): one handler per operation code, each
//!   a no-op on missing or malformed input
//! - **Routing** ([`route_message`]): decides whether an inbound message is
//!   for this server and which local player receives it
//! - **RTP orchestration**: batch safe-location resolution with concurrent
//!   lookups, bounded by timeouts
//! - **Transport** ([`Broker`], [`LocalNetwork`]): the handler only sees the
//!   broker trait; [`LocalNetwork`] connects servers inside one process
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use waystone_network::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), NetworkError> {
//!     let network = LocalNetwork::new();
//!     let backend = Arc::new(MemoryBackend::new("survival"));
//!     backend.add_world("world");
//!
//!     let services = NetworkServices::from_backend(backend, network.clone());
//!     let handler = Arc::new(MessageHandler::new(NetworkConfig::new("survival"), services)?);
//!     network.attach(handler.clone());
//!
//!     handler.request_user_lists(None).await?;
//!     network.shutdown();
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod handler;
pub mod memory;
pub mod messaging;
pub mod rtp;
pub mod services;
pub mod stats;
pub mod types;


pub use broker::{Broker, LocalNetwork};
pub use config::{NetworkConfig, RtpConfig};
pub use error::{NetworkError, PayloadError};
pub use handler::MessageHandler;
pub use memory::{MemoryBackend, RtpMode, SafeGroundCheck};
pub use messaging::{
    route_message, route_raw, ApiRtpRequest, Message, MessageBuilder, MessageType, Payload,
    TargetKind, TARGET_ALL,
};
pub use rtp::{randomize_around, PendingRtpRequest, RtpRequestTracker, RANDOMIZATION_RADIUS};
pub use services::{
    Database, HomeCache, LocalBackend, Locales, NetworkServices, Notifier, RandomTeleportEngine,
    RequestManager, SafeLocationResolver, Teleport, TeleportAction, Teleporter, UserDirectory,
    WarpCache, WorldRegistry,
};
pub use stats::{HandlerStats, HandlerStatsSnapshot};
pub use types::{
    current_timestamp, Home, Location, OnlineUser, Position, TeleportRequest, TeleportRequestKind,
    TeleportRequestStatus, User, Warp, World,
};
