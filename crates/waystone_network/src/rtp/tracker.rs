//! Outstanding API RTP requests awaiting their `API_RTP_LOCATION` reply.

use crate::error::NetworkError;
use crate::types::Position;
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Registry of API RTP requests sent by this server, keyed by request id.
///
/// Entries are removed when completed, timed out, or cancelled, so a lost
/// reply never leaves a request behind.
#[derive(Debug, Default)]
pub struct RtpRequestTracker {
    pending: DashMap<String, oneshot::Sender<Vec<Position>>>,
}

/// The waiting half of a registered request.
#[derive(Debug)]
pub struct PendingRtpRequest {
    request_id: String,
    receiver: oneshot::Receiver<Vec<Position>>,
}

impl RtpRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request under a fresh id.
    pub fn register(&self) -> PendingRtpRequest {
        let request_id = Uuid::new_v4().to_string();
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(request_id.clone(), sender);
        PendingRtpRequest {
            request_id,
            receiver,
        }
    }

    /// Completes a pending request. Returns `false` if the id is unknown
    /// (already completed, timed out, or never issued here).
    pub fn complete(&self, request_id: &str, positions: Vec<Position>) -> bool {
        match self.pending.remove(request_id) {
            Some((_, sender)) => {
                // The waiter may have given up between removal and send
                let _ = sender.send(positions);
                true
            }
            None => {
                debug!("🎲 No pending API RTP request {}", request_id);
                false
            }
        }
    }

    /// Drops a pending request without completing it.
    pub fn cancel(&self, request_id: &str) {
        self.pending.remove(request_id);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl PendingRtpRequest {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Waits for the reply, removing the request from `tracker` on timeout.
    pub async fn wait(
        self,
        tracker: &RtpRequestTracker,
        timeout: Duration,
    ) -> Result<Vec<Position>, NetworkError> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(positions)) => Ok(positions),
            Ok(Err(_)) => Err(NetworkError::Cancelled(self.request_id)),
            Err(_) => {
                tracker.cancel(&self.request_id);
                Err(NetworkError::Timeout {
                    request_id: self.request_id,
                    after: timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::World;

    fn position() -> Position {
        Position::at(1.0, 64.0, 1.0, World::new("world", Uuid::nil()), "survival")
    }

    #[tokio::test]
    async fn test_complete_delivers_positions() {
        let tracker = RtpRequestTracker::new();
        let pending = tracker.register();
        let request_id = pending.request_id().to_string();
        assert_eq!(tracker.pending_count(), 1);

        assert!(tracker.complete(&request_id, vec![position()]));
        let positions = pending
            .wait(&tracker, Duration::from_secs(1))
            .await
            .expect("completed request should resolve");
        assert_eq!(positions, vec![position()]);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_request_is_ignored() {
        let tracker = RtpRequestTracker::new();
        assert!(!tracker.complete("missing", Vec::new()));
    }

    #[tokio::test]
    async fn test_timeout_removes_pending_request() {
        let tracker = RtpRequestTracker::new();
        let pending = tracker.register();
        let request_id = pending.request_id().to_string();

        let result = pending.wait(&tracker, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(NetworkError::Timeout { .. })));
        assert_eq!(tracker.pending_count(), 0);
        assert!(!tracker.complete(&request_id, Vec::new()));
    }

    #[tokio::test]
    async fn test_cancel_resolves_waiter_as_cancelled() {
        let tracker = RtpRequestTracker::new();
        let pending = tracker.register();
        tracker.cancel(pending.request_id());

        let result = pending.wait(&tracker, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(NetworkError::Cancelled(_))));
    }
}
