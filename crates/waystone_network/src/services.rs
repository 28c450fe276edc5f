//! Local collaborators consumed by the messaging core.
//!
//! The core owns no storage: home and warp caches, the database, the user
//! list, teleport execution and the random-teleport machinery are all
//! injected through these traits when a [`MessageHandler`] is built.
//!
//! Synchronous traits are single, self-contained calls; the core never
//! holds one across an `.await`. The random-teleport engine, the
//! safe-location resolver and the teleporter are asynchronous.
//!
//! [`MessageHandler`]: crate::handler::MessageHandler

use crate::broker::Broker;
use crate::error::NetworkError;
use crate::types::{Home, Location, OnlineUser, Position, TeleportRequest, User, Warp, World};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent home/warp storage.
pub trait Database: Send + Sync {
    fn get_home(&self, id: Uuid) -> Result<Option<Home>, NetworkError>;

    fn get_warp(&self, id: Uuid) -> Result<Option<Warp>, NetworkError>;
}

/// The home cache of the local server.
///
/// `propagate` asks the cache to tell the rest of the network about the
/// change; the core always passes `false` when applying a remote update.
pub trait HomeCache: Send + Sync {
    fn cache_home(&self, home: Home, propagate: bool);

    fn uncache_home(&self, id: Uuid, propagate: bool);

    fn update_public_home_cache(&self);
}

/// The warp cache of the local server.
pub trait WarpCache: Send + Sync {
    fn cache_warp(&self, warp: Warp, propagate: bool);

    fn uncache_warp(&self, id: Uuid, propagate: bool);

    fn update_warp_cache(&self);
}

/// Who is online locally, and the cached user lists of other servers.
pub trait UserDirectory: Send + Sync {
    fn online_users(&self) -> Vec<OnlineUser>;

    /// Replaces the cached user list of `server`.
    fn set_user_list(&self, server: &str, users: Vec<User>);

    /// Finds a locally online user by username, ignoring ASCII case.
    fn find_online_user(&self, username: &str) -> Option<OnlineUser> {
        self.online_users()
            .into_iter()
            .find(|online| online.user.matches_name(username))
    }
}

/// The local teleport-request subsystem.
pub trait RequestManager: Send + Sync {
    /// Delivers a request to a local recipient for accept/decline.
    fn send_local_teleport_request(&self, request: TeleportRequest, recipient: &OnlineUser);

    /// Resolves a pending request with the recipient's answer.
    fn handle_local_request_response(&self, requester: &OnlineUser, request: TeleportRequest);
}

/// Tags attached to a teleport for economy/transaction bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TeleportAction {
    RandomTeleport,
}

/// A teleport to execute on the local server.
#[derive(Debug, Clone, PartialEq)]
pub struct Teleport {
    pub teleporter: OnlineUser,
    pub target: Position,
    pub actions: Vec<TeleportAction>,
    /// Whether the teleport goes through the warmup timer
    pub timed: bool,
}

impl Teleport {
    /// An immediate teleport with no actions attached.
    pub fn immediate(teleporter: OnlineUser, target: Position) -> Self {
        Self {
            teleporter,
            target,
            actions: Vec::new(),
            timed: false,
        }
    }
}

/// Physically moves players once a target position is known.
#[async_trait]
pub trait Teleporter: Send + Sync {
    async fn execute(&self, teleport: Teleport) -> Result<(), NetworkError>;
}

/// Translated message lookup.
pub trait Locales: Send + Sync {
    fn get_locale(&self, key: &str) -> Option<String>;
}

/// Sends chat messages to local players.
pub trait Notifier: Send + Sync {
    fn send_message(&self, user: &OnlineUser, text: &str);
}

/// Worlds hosted by the local server.
pub trait WorldRegistry: Send + Sync {
    fn worlds(&self) -> Vec<World>;

    /// Finds a world by name, ignoring ASCII case.
    fn find_world(&self, name: &str) -> Option<World> {
        self.worlds().into_iter().find(|world| world.matches_name(name))
    }
}

/// Produces random candidate positions.
#[async_trait]
pub trait RandomTeleportEngine: Send + Sync {
    /// A random position in `world` (or wherever the engine chooses when
    /// `world` is `None`), avoiding the named exclusion rules.
    async fn random_position(
        &self,
        world: Option<&World>,
        excluded_rules: &[String],
    ) -> Option<Position>;
}

/// Adjusts raw positions into physically safe ones.
#[async_trait]
pub trait SafeLocationResolver: Send + Sync {
    async fn find_safe_ground_location(&self, position: &Position) -> Option<Location>;
}

/// A type providing every local collaborator at once.
pub trait LocalBackend:
    Database
    + HomeCache
    + WarpCache
    + UserDirectory
    + RequestManager
    + Teleporter
    + Locales
    + Notifier
    + WorldRegistry
    + RandomTeleportEngine
    + SafeLocationResolver
{
}

impl<T> LocalBackend for T where
    T: Database
        + HomeCache
        + WarpCache
        + UserDirectory
        + RequestManager
        + Teleporter
        + Locales
        + Notifier
        + WorldRegistry
        + RandomTeleportEngine
        + SafeLocationResolver
{
}

/// Handles to every collaborator a [`MessageHandler`] uses.
///
/// [`MessageHandler`]: crate::handler::MessageHandler
#[derive(Clone)]
pub struct NetworkServices {
    pub broker: Arc<dyn Broker>,
    pub database: Arc<dyn Database>,
    pub homes: Arc<dyn HomeCache>,
    pub warps: Arc<dyn WarpCache>,
    pub users: Arc<dyn UserDirectory>,
    pub requests: Arc<dyn RequestManager>,
    pub teleporter: Arc<dyn Teleporter>,
    pub locales: Arc<dyn Locales>,
    pub notifier: Arc<dyn Notifier>,
    pub worlds: Arc<dyn WorldRegistry>,
    pub rtp_engine: Arc<dyn RandomTeleportEngine>,
    pub safe_locations: Arc<dyn SafeLocationResolver>,
}

impl NetworkServices {
    /// Wires every local collaborator to one backend.
    pub fn from_backend<B>(backend: Arc<B>, broker: Arc<dyn Broker>) -> Self
    where
        B: LocalBackend + 'static,
    {
        Self {
            broker,
            database: backend.clone(),
            homes: backend.clone(),
            warps: backend.clone(),
            users: backend.clone(),
            requests: backend.clone(),
            teleporter: backend.clone(),
            locales: backend.clone(),
            notifier: backend.clone(),
            worlds: backend.clone(),
            rtp_engine: backend.clone(),
            safe_locations: backend,
        }
    }
}

impl std::fmt::Debug for NetworkServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkServices")
            .field("broker", &self.broker)
            .field("collaborators", &"[local services]")
            .finish()
    }
}
