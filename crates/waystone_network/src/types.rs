//! # Core Type Definitions
//!
//! Value types shared by every message on the network. They are plain data:
//! the messaging core only constructs, offsets and forwards them, and never
//! interprets world geometry itself.
//!
//! ## Key Types
//!
//! - [`World`] - A named world hosted by some server
//! - [`Location`] - A 3D point inside a world, without server ownership
//! - [`Position`] - A [`Location`] stamped with the server that owns it
//! - [`User`] / [`OnlineUser`] - Player identity and a live snapshot of it
//! - [`Home`] / [`Warp`] - Saved positions managed by the cache subsystems
//! - [`TeleportRequest`] - A pending player-to-player teleport invitation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Spatial Types
// ============================================================================

/// A world hosted on a server.
///
/// Worlds are identified by name for lookups coming over the network
/// (case-insensitively, see [`World::matches_name`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct World {
    /// The world's name, e.g. `world_nether`
    pub name: String,
    /// The world's unique identifier on its server
    pub uuid: Uuid,
}

impl World {
    /// Creates a new world reference.
    pub fn new(name: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            name: name.into(),
            uuid,
        }
    }

    /// Whether this world is called `name`, ignoring ASCII case.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A point in a world, as produced by the safe-location resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    pub world: World,
}

impl Location {
    /// Creates a location facing yaw/pitch zero.
    pub fn new(x: f64, y: f64, z: f64, world: World) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
            world,
        }
    }
}

/// A location on a specific server of the network.
///
/// Uses double precision for coordinates, matching what the game servers
/// report for player positions.
///
/// # Examples
///
/// ```rust
/// use waystone_network::{Position, World};
/// use uuid::Uuid;
///
/// let nether = World::new("world_nether", Uuid::new_v4());
/// let spawn = Position::at(100.0, 64.0, 100.0, nether, "survival");
/// assert_eq!(spawn.server, "survival");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (east-west axis)
    pub x: f64,
    /// Y coordinate (vertical axis)
    pub y: f64,
    /// Z coordinate (north-south axis)
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    /// The world containing this position
    pub world: World,
    /// Name of the server hosting `world`
    pub server: String,
}

impl Position {
    /// Creates a position facing yaw/pitch zero.
    pub fn at(x: f64, y: f64, z: f64, world: World, server: impl Into<String>) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
            world,
            server: server.into(),
        }
    }

    /// Stamps a resolved location with the name of the server that owns it.
    pub fn from_location(location: Location, server: impl Into<String>) -> Self {
        Self {
            x: location.x,
            y: location.y,
            z: location.z,
            yaw: location.yaw,
            pitch: location.pitch,
            world: location.world,
            server: server.into(),
        }
    }

    /// Drops the server ownership, keeping the point and world.
    pub fn to_location(&self) -> Location {
        Location {
            x: self.x,
            y: self.y,
            z: self.z,
            yaw: self.yaw,
            pitch: self.pitch,
            world: self.world.clone(),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// A player identity as exchanged in user lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub uuid: Uuid,
    pub username: String,
}

impl User {
    pub fn new(uuid: Uuid, username: impl Into<String>) -> Self {
        Self {
            uuid,
            username: username.into(),
        }
    }

    /// Whether this user is called `name`, ignoring ASCII case.
    pub fn matches_name(&self, name: &str) -> bool {
        self.username.eq_ignore_ascii_case(name)
    }
}

/// Snapshot of a player that is online on the local server.
///
/// The router hands an `OnlineUser` to handlers as the message receiver;
/// handlers read the position from it when answering position requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineUser {
    pub user: User,
    pub position: Position,
}

impl OnlineUser {
    pub fn new(user: User, position: Position) -> Self {
        Self { user, position }
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}

// ============================================================================
// Saved Positions
// ============================================================================

/// A player's home, owned by the homes cache subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Home {
    pub id: Uuid,
    pub name: String,
    pub owner: User,
    pub position: Position,
    #[serde(default)]
    pub public: bool,
}

/// A server-wide warp, owned by the warps cache subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warp {
    pub id: Uuid,
    pub name: String,
    pub position: Position,
}

// ============================================================================
// Teleport Requests
// ============================================================================

/// Whether the requester wants to go to the recipient, or bring them over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeleportRequestKind {
    /// Requester teleports to the recipient
    Tpa,
    /// Recipient teleports to the requester
    TpaHere,
}

/// Lifecycle state of a teleport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeleportRequestStatus {
    Pending,
    Accepted,
    Declined,
    Ignored,
}

/// One player's outstanding request to teleport to/with another player.
///
/// Carries enough identity for the recipient's server to answer it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportRequest {
    pub requester_name: String,
    pub requester_position: Position,
    #[serde(rename = "type")]
    pub kind: TeleportRequestKind,
    /// Unix timestamp (seconds) after which the request lapses
    pub expiry_time: u64,
    #[serde(default)]
    pub recipient_name: Option<String>,
    pub status: TeleportRequestStatus,
}

/// Returns the current Unix timestamp in seconds.
///
/// Returns `0` if the system clock is set before the Unix epoch.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
