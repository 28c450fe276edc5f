//! Statistics tracking for the message handler.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the handler as messages are processed.
#[derive(Debug, Default)]
pub struct HandlerStats {
    messages_handled: AtomicU64,
    malformed_dropped: AtomicU64,
    replies_sent: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of [`HandlerStats`] for reporting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerStatsSnapshot {
    /// Inbound messages dispatched to a handler
    pub messages_handled: u64,
    /// Inbound messages dropped because their payload was malformed
    pub malformed_dropped: u64,
    /// Outbound messages accepted by the broker
    pub replies_sent: u64,
    /// Outbound messages the broker refused
    pub send_failures: u64,
}

impl HandlerStats {
    pub(crate) fn record_handled(&self) {
        self.messages_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HandlerStatsSnapshot {
        HandlerStatsSnapshot {
            messages_handled: self.messages_handled.load(Ordering::Relaxed),
            malformed_dropped: self.malformed_dropped.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}
