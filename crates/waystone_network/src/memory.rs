//! In-memory implementation of every local collaborator.
//!
//! [`MemoryBackend`] keeps each server's state in process and records every
//! side effect the messaging core triggers, so the node binary can run a
//! whole network locally and tests can assert on what happened.

use crate::error::NetworkError;
use crate::services::{
    Database, HomeCache, Locales, Notifier, RandomTeleportEngine, RequestManager,
    SafeLocationResolver, Teleport, Teleporter, UserDirectory, WarpCache, WorldRegistry,
};
use crate::types::{Home, Location, OnlineUser, Position, TeleportRequest, User, Warp, World};
use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Default locale strings known to every backend.
const DEFAULT_LOCALES: &[(&str, &str)] = &[(
    "error_rtp_randomization_timeout",
    "Failed to find a safe place to teleport you to. Please try again.",
)];

/// How the backend's random-teleport engine picks positions.
#[derive(Debug, Clone, PartialEq)]
pub enum RtpMode {
    /// Uniformly within `radius` of the origin of the requested world
    Random { radius: f64, y: f64 },
    /// Always this position
    Fixed(Position),
    /// Never finds a position
    Unavailable,
    /// Never completes
    Hang,
}

/// Predicate deciding whether a candidate position is safe ground.
pub type SafeGroundCheck = Arc<dyn Fn(&Position) -> bool + Send + Sync>;

/// In-process state for one server.
pub struct MemoryBackend {
    server_name: String,
    online: Mutex<Vec<OnlineUser>>,
    network_users: DashMap<String, Vec<User>>,
    stored_homes: DashMap<Uuid, Home>,
    stored_warps: DashMap<Uuid, Warp>,
    cached_homes: DashMap<Uuid, Home>,
    cached_warps: DashMap<Uuid, Warp>,
    public_home_refreshes: AtomicUsize,
    warp_refreshes: AtomicUsize,
    received_requests: Mutex<Vec<(String, TeleportRequest)>>,
    resolved_requests: Mutex<Vec<(String, TeleportRequest)>>,
    teleports: Mutex<Vec<Teleport>>,
    chat: Mutex<Vec<(String, String)>>,
    locales: DashMap<String, String>,
    worlds: Mutex<Vec<World>>,
    rtp_mode: Mutex<RtpMode>,
    safe_ground: Mutex<Option<SafeGroundCheck>>,
    hang_safe_lookups: AtomicBool,
    safe_lookups: AtomicUsize,
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryBackend {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            online: Mutex::new(Vec::new()),
            network_users: DashMap::new(),
            stored_homes: DashMap::new(),
            stored_warps: DashMap::new(),
            cached_homes: DashMap::new(),
            cached_warps: DashMap::new(),
            public_home_refreshes: AtomicUsize::new(0),
            warp_refreshes: AtomicUsize::new(0),
            received_requests: Mutex::new(Vec::new()),
            resolved_requests: Mutex::new(Vec::new()),
            teleports: Mutex::new(Vec::new()),
            chat: Mutex::new(Vec::new()),
            locales: DEFAULT_LOCALES
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            worlds: Mutex::new(Vec::new()),
            rtp_mode: Mutex::new(RtpMode::Random {
                radius: 5_000.0,
                y: 64.0,
            }),
            safe_ground: Mutex::new(None),
            hang_safe_lookups: AtomicBool::new(false),
            safe_lookups: AtomicUsize::new(0),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Adds a world to this server and returns it.
    pub fn add_world(&self, name: impl Into<String>) -> World {
        let world = World::new(name, Uuid::new_v4());
        lock(&self.worlds).push(world.clone());
        world
    }

    /// Brings a player online at `position`.
    pub fn add_online_user(&self, username: impl Into<String>, position: Position) -> OnlineUser {
        let online = OnlineUser::new(User::new(Uuid::new_v4(), username), position);
        lock(&self.online).push(online.clone());
        online
    }

    pub fn remove_online_user(&self, username: &str) {
        lock(&self.online).retain(|online| !online.user.matches_name(username));
    }

    /// Stores a home in the database without caching it.
    pub fn store_home(&self, home: Home) {
        self.stored_homes.insert(home.id, home);
    }

    pub fn delete_home(&self, id: Uuid) {
        self.stored_homes.remove(&id);
    }

    /// Stores a warp in the database without caching it.
    pub fn store_warp(&self, warp: Warp) {
        self.stored_warps.insert(warp.id, warp);
    }

    pub fn delete_warp(&self, id: Uuid) {
        self.stored_warps.remove(&id);
    }

    pub fn set_locale(&self, key: impl Into<String>, value: impl Into<String>) {
        self.locales.insert(key.into(), value.into());
    }

    pub fn remove_locale(&self, key: &str) {
        self.locales.remove(key);
    }

    pub fn set_rtp_mode(&self, mode: RtpMode) {
        *lock(&self.rtp_mode) = mode;
    }

    /// Sets which candidates count as safe ground; all are safe by default.
    pub fn set_safe_ground(&self, check: SafeGroundCheck) {
        *lock(&self.safe_ground) = Some(check);
    }

    /// Makes every safe-location lookup hang forever.
    pub fn hang_safe_lookups(&self, hang: bool) {
        self.hang_safe_lookups.store(hang, Ordering::Relaxed);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The cached user list of another server.
    pub fn user_list(&self, server: &str) -> Option<Vec<User>> {
        self.network_users.get(server).map(|users| users.clone())
    }

    pub fn cached_home(&self, id: Uuid) -> Option<Home> {
        self.cached_homes.get(&id).map(|home| home.clone())
    }

    pub fn cached_warp(&self, id: Uuid) -> Option<Warp> {
        self.cached_warps.get(&id).map(|warp| warp.clone())
    }

    pub fn public_home_refreshes(&self) -> usize {
        self.public_home_refreshes.load(Ordering::Relaxed)
    }

    pub fn warp_refreshes(&self) -> usize {
        self.warp_refreshes.load(Ordering::Relaxed)
    }

    /// Teleport requests delivered to local recipients, as `(recipient, request)`.
    pub fn received_requests(&self) -> Vec<(String, TeleportRequest)> {
        lock(&self.received_requests).clone()
    }

    /// Teleport request answers delivered to local requesters, as `(requester, request)`.
    pub fn resolved_requests(&self) -> Vec<(String, TeleportRequest)> {
        lock(&self.resolved_requests).clone()
    }

    pub fn teleports(&self) -> Vec<Teleport> {
        lock(&self.teleports).clone()
    }

    /// Chat messages sent to `username`.
    pub fn messages_for(&self, username: &str) -> Vec<String> {
        lock(&self.chat)
            .iter()
            .filter(|(recipient, _)| recipient.eq_ignore_ascii_case(username))
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Number of safe-location lookups started so far.
    pub fn safe_lookups(&self) -> usize {
        self.safe_lookups.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("server_name", &self.server_name)
            .field("online", &lock(&self.online).len())
            .field("cached_homes", &self.cached_homes.len())
            .field("cached_warps", &self.cached_warps.len())
            .finish()
    }
}

impl Database for MemoryBackend {
    fn get_home(&self, id: Uuid) -> Result<Option<Home>, NetworkError> {
        Ok(self.stored_homes.get(&id).map(|home| home.clone()))
    }

    fn get_warp(&self, id: Uuid) -> Result<Option<Warp>, NetworkError> {
        Ok(self.stored_warps.get(&id).map(|warp| warp.clone()))
    }
}

impl HomeCache for MemoryBackend {
    fn cache_home(&self, home: Home, _propagate: bool) {
        self.cached_homes.insert(home.id, home);
    }

    fn uncache_home(&self, id: Uuid, _propagate: bool) {
        self.cached_homes.remove(&id);
    }

    fn update_public_home_cache(&self) {
        self.cached_homes.retain(|id, _| self.stored_homes.contains_key(id));
        for home in self.stored_homes.iter().filter(|home| home.public) {
            self.cached_homes.insert(home.id, home.clone());
        }
        self.public_home_refreshes.fetch_add(1, Ordering::Relaxed);
    }
}

impl WarpCache for MemoryBackend {
    fn cache_warp(&self, warp: Warp, _propagate: bool) {
        self.cached_warps.insert(warp.id, warp);
    }

    fn uncache_warp(&self, id: Uuid, _propagate: bool) {
        self.cached_warps.remove(&id);
    }

    fn update_warp_cache(&self) {
        self.cached_warps.clear();
        for warp in self.stored_warps.iter() {
            self.cached_warps.insert(warp.id, warp.clone());
        }
        self.warp_refreshes.fetch_add(1, Ordering::Relaxed);
    }
}

impl UserDirectory for MemoryBackend {
    fn online_users(&self) -> Vec<OnlineUser> {
        lock(&self.online).clone()
    }

    fn set_user_list(&self, server: &str, users: Vec<User>) {
        self.network_users.insert(server.to_string(), users);
    }
}

impl RequestManager for MemoryBackend {
    fn send_local_teleport_request(&self, request: TeleportRequest, recipient: &OnlineUser) {
        lock(&self.received_requests).push((recipient.username().to_string(), request));
    }

    fn handle_local_request_response(&self, requester: &OnlineUser, request: TeleportRequest) {
        lock(&self.resolved_requests).push((requester.username().to_string(), request));
    }
}

#[async_trait]
impl Teleporter for MemoryBackend {
    async fn execute(&self, teleport: Teleport) -> Result<(), NetworkError> {
        let username = teleport.teleporter.username().to_string();
        if teleport.target.server == self.server_name {
            let mut online = lock(&self.online);
            let player = online
                .iter_mut()
                .find(|online| online.user.matches_name(&username))
                .ok_or_else(|| NetworkError::Teleport(format!("{username} is not online")))?;
            player.position = teleport.target.clone();
        }
        lock(&self.teleports).push(teleport);
        Ok(())
    }
}

impl Locales for MemoryBackend {
    fn get_locale(&self, key: &str) -> Option<String> {
        self.locales.get(key).map(|value| value.clone())
    }
}

impl Notifier for MemoryBackend {
    fn send_message(&self, user: &OnlineUser, text: &str) {
        lock(&self.chat).push((user.username().to_string(), text.to_string()));
    }
}

impl WorldRegistry for MemoryBackend {
    fn worlds(&self) -> Vec<World> {
        lock(&self.worlds).clone()
    }
}

#[async_trait]
impl RandomTeleportEngine for MemoryBackend {
    async fn random_position(
        &self,
        world: Option<&World>,
        _excluded_rules: &[String],
    ) -> Option<Position> {
        let mode = lock(&self.rtp_mode).clone();
        match mode {
            RtpMode::Random { radius, y } => {
                let world = world.cloned().or_else(|| self.worlds().into_iter().next())?;
                let mut rng = rand::thread_rng();
                let x = rng.gen_range(-radius..=radius);
                let z = rng.gen_range(-radius..=radius);
                Some(Position::at(x, y, z, world, self.server_name.clone()))
            }
            RtpMode::Fixed(position) => Some(position),
            RtpMode::Unavailable => None,
            RtpMode::Hang => futures::future::pending().await,
        }
    }
}

#[async_trait]
impl SafeLocationResolver for MemoryBackend {
    async fn find_safe_ground_location(&self, position: &Position) -> Option<Location> {
        self.safe_lookups.fetch_add(1, Ordering::Relaxed);
        if self.hang_safe_lookups.load(Ordering::Relaxed) {
            return futures::future::pending().await;
        }

        let check = lock(&self.safe_ground).clone();
        match check {
            Some(is_safe) if !is_safe(position) => None,
            _ => Some(position.to_location()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (MemoryBackend, World) {
        let backend = MemoryBackend::new("survival");
        let world = backend.add_world("world");
        (backend, world)
    }

    #[test]
    fn test_public_home_refresh_mirrors_database() {
        let (backend, world) = backend();
        let owner = User::new(Uuid::new_v4(), "alice");
        let position = Position::at(0.0, 64.0, 0.0, world, "survival");
        let public = Home {
            id: Uuid::new_v4(),
            name: "shop".to_string(),
            owner: owner.clone(),
            position: position.clone(),
            public: true,
        };
        let private = Home {
            id: Uuid::new_v4(),
            name: "bed".to_string(),
            owner,
            position,
            public: false,
        };
        backend.store_home(public.clone());
        backend.store_home(private.clone());

        backend.update_public_home_cache();
        assert_eq!(backend.cached_home(public.id), Some(public.clone()));
        assert!(backend.cached_home(private.id).is_none());

        backend.delete_home(public.id);
        backend.update_public_home_cache();
        assert!(backend.cached_home(public.id).is_none());
        assert_eq!(backend.public_home_refreshes(), 2);
    }

    #[tokio::test]
    async fn test_teleport_moves_local_player_only() {
        let (backend, world) = backend();
        let alice = backend
            .add_online_user("alice", Position::at(0.0, 64.0, 0.0, world.clone(), "survival"));

        let local = Position::at(5.0, 70.0, 5.0, world.clone(), "survival");
        backend
            .execute(Teleport::immediate(alice.clone(), local.clone()))
            .await
            .unwrap();
        assert_eq!(backend.find_online_user("alice").map(|u| u.position), Some(local.clone()));

        let remote = Position::at(9.0, 70.0, 9.0, world, "lobby");
        backend
            .execute(Teleport::immediate(alice, remote))
            .await
            .unwrap();
        assert_eq!(backend.find_online_user("alice").map(|u| u.position), Some(local));
        assert_eq!(backend.teleports().len(), 2);
    }

    #[tokio::test]
    async fn test_teleport_of_offline_player_fails() {
        let (backend, world) = backend();
        let ghost = OnlineUser::new(
            User::new(Uuid::new_v4(), "ghost"),
            Position::at(0.0, 64.0, 0.0, world.clone(), "survival"),
        );
        let target = Position::at(1.0, 64.0, 1.0, world, "survival");
        let result = backend.execute(Teleport::immediate(ghost, target)).await;
        assert!(matches!(result, Err(NetworkError::Teleport(_))));
        assert!(backend.teleports().is_empty());
    }

    #[tokio::test]
    async fn test_random_position_stays_in_radius() {
        let (backend, world) = backend();
        backend.set_rtp_mode(RtpMode::Random { radius: 100.0, y: 80.0 });

        let position = backend.random_position(Some(&world), &[]).await.unwrap();
        assert!(position.x.abs() <= 100.0 && position.z.abs() <= 100.0);
        assert_eq!(position.y, 80.0);
        assert_eq!(position.world, world);
        assert_eq!(position.server, "survival");
    }

    #[tokio::test]
    async fn test_safe_ground_check_filters_candidates() {
        let (backend, world) = backend();
        backend.set_safe_ground(Arc::new(|position: &Position| position.x >= 0.0));

        let safe = Position::at(3.0, 64.0, 0.0, world.clone(), "survival");
        let unsafe_spot = Position::at(-3.0, 64.0, 0.0, world, "survival");
        assert_eq!(backend.find_safe_ground_location(&safe).await, Some(safe.to_location()));
        assert!(backend.find_safe_ground_location(&unsafe_spot).await.is_none());
        assert_eq!(backend.safe_lookups(), 2);
    }

    #[test]
    fn test_default_locales_are_seeded() {
        let (backend, _) = backend();
        assert!(backend.get_locale("error_rtp_randomization_timeout").is_some());
        backend.remove_locale("error_rtp_randomization_timeout");
        assert!(backend.get_locale("error_rtp_randomization_timeout").is_none());
    }
}
