//! In-process per-room change feed fan-out.
//!
//! Events are published after the owning transaction commits and carry
//! the committed `lock_version`, so a consumer never observes a
//! partially-applied move. Transporting events beyond one node is a
//! collaborator concern.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomEventKind {
    SeatsChanged,
    StateChanged,
    GameOver,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomEvent {
    pub room_id: i64,
    /// Version of the game state row after the change; 0 for lobby-only
    /// changes that happened before any deal.
    pub lock_version: i32,
    pub kind: RoomEventKind,
}

#[derive(Default)]
pub struct RoomHub {
    channels: RwLock<HashMap<i64, broadcast::Sender<RoomEvent>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, room_id: i64) -> broadcast::Sender<RoomEvent> {
        if let Some(tx) = self.channels.read().get(&room_id) {
            return tx.clone();
        }
        let mut channels = self.channels.write();
        channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    pub fn subscribe(&self, room_id: i64) -> broadcast::Receiver<RoomEvent> {
        self.sender(room_id).subscribe()
    }

    /// Publish to current subscribers. Call only after the transaction
    /// that produced the change has committed.
    pub fn publish(&self, event: RoomEvent) {
        let tx = self.sender(event.room_id);
        // Err means no live subscribers, which is fine.
        let _ = tx.send(event);
    }

    /// Drop a reclaimed room's channel.
    pub fn forget(&self, room_id: i64) {
        self.channels.write().remove(&room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = RoomHub::new();
        let mut rx = hub.subscribe(7);
        hub.publish(RoomEvent {
            room_id: 7,
            lock_version: 3,
            kind: RoomEventKind::StateChanged,
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.lock_version, 3);
        assert_eq!(event.kind, RoomEventKind::StateChanged);
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let hub = RoomHub::new();
        let mut rx_other = hub.subscribe(2);
        hub.publish(RoomEvent {
            room_id: 1,
            lock_version: 1,
            kind: RoomEventKind::SeatsChanged,
        });
        assert!(matches!(
            rx_other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let hub = RoomHub::new();
        hub.publish(RoomEvent {
            room_id: 9,
            lock_version: 1,
            kind: RoomEventKind::GameOver,
        });
        hub.forget(9);
    }
}
