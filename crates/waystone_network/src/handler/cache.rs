//! Home and warp cache invalidation.

use super::MessageHandler;
use crate::error::PayloadError;
use crate::messaging::Message;
use tracing::{debug, warn};
use uuid::Uuid;

impl MessageHandler {
    /// Re-fetches a changed home, caching it if it still exists and
    /// evicting it otherwise.
    pub(super) fn handle_update_home(&self, message: &Message) {
        let Some(id) = self.changed_id(message) else {
            return;
        };

        match self.services.database.get_home(id) {
            Ok(Some(home)) => self.services.homes.cache_home(home, false),
            Ok(None) => {
                debug!("🏠 Home {} no longer exists, evicting", id);
                self.services.homes.uncache_home(id, false);
            }
            Err(e) => warn!("⚠️ Failed to fetch home {}: {}", id, e),
        }
    }

    /// Re-fetches a changed warp, caching it if it still exists and
    /// evicting it otherwise.
    pub(super) fn handle_update_warp(&self, message: &Message) {
        let Some(id) = self.changed_id(message) else {
            return;
        };

        match self.services.database.get_warp(id) {
            Ok(Some(warp)) => self.services.warps.cache_warp(warp, false),
            Ok(None) => {
                debug!("🧭 Warp {} no longer exists, evicting", id);
                self.services.warps.uncache_warp(id, false);
            }
            Err(e) => warn!("⚠️ Failed to fetch warp {}: {}", id, e),
        }
    }

    pub(super) fn handle_update_caches(&self) {
        self.services.homes.update_public_home_cache();
        self.services.warps.update_warp_cache();
    }

    /// The home/warp id carried by an update message.
    fn changed_id(&self, message: &Message) -> Option<Uuid> {
        let raw = message.payload().get_text()?;
        match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                self.stats.record_malformed();
                warn!(
                    "⚠️ Invalid {} payload from {}: {}",
                    message.kind(),
                    message.source_server(),
                    PayloadError::InvalidId(raw.to_string())
                );
                None
            }
        }
    }
}
