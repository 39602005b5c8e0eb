// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Refresh notification emission.
//!
//! The dispatcher publishes exactly one [`RefreshAction`] per succeeded job.
//! Consumers (UI push channels, cache layers) subscribe through whatever
//! implements [`RefreshSink`]; the framework itself never waits on them.

use tokio::sync::broadcast;
use tracing::debug;

use crate::job::RefreshAction;

/// Receives the refresh descriptor of each succeeded job.
pub trait RefreshSink: Send + Sync {
    /// Publish one refresh action. Must not block.
    fn publish(&self, action: RefreshAction);
}

/// Broadcast-channel sink; every subscriber sees every action.
pub struct RefreshBroadcaster {
    tx: broadcast::Sender<RefreshAction>,
}

impl RefreshBroadcaster {
    /// Sink with the given channel capacity. Slow subscribers lag rather
    /// than blocking the dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future refresh actions.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshAction> {
        self.tx.subscribe()
    }
}

impl Default for RefreshBroadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}

impl RefreshSink for RefreshBroadcaster {
    fn publish(&self, action: RefreshAction) {
        debug!(
            server = %action.server,
            well_uid = %action.well_uid,
            entity = %action.entity_type,
            "publishing refresh action"
        );
        // No subscribers is fine; the action is simply dropped.
        let _ = self.tx.send(action);
    }
}

/// Sink that discards every action (embedding without a UI).
pub struct DiscardRefresh;

impl RefreshSink for DiscardRefresh {
    fn publish(&self, _action: RefreshAction) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobType;
    use wellgate_witsml::WitsmlType;

    fn action() -> RefreshAction {
        RefreshAction {
            server: "rig-1".to_string(),
            well_uid: "W-1".to_string(),
            wellbore_uid: Some("WB-1".to_string()),
            entity_type: WitsmlType::Log,
            job_type: JobType::CreateObject,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_actions() {
        let sink = RefreshBroadcaster::new(8);
        let mut rx = sink.subscribe();

        sink.publish(action());
        let received = rx.recv().await.unwrap();
        assert_eq!(received.server, "rig-1");
        assert_eq!(received.wellbore_uid.as_deref(), Some("WB-1"));
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let sink = RefreshBroadcaster::new(8);
        sink.publish(action());
        DiscardRefresh.publish(action());
    }
}
