use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use super::messages::RoomEvent;
use super::registry::SubscriptionRegistry;

/// Fans room events out to every live subscriber of the room
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<SubscriptionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver one event to every subscriber of `event.room_id`.
    ///
    /// Never fails: a subscriber that cannot take the frame is cancelled and
    /// the remaining subscribers still receive it. A room with no subscribers
    /// is a no-op. Returns the number of subscribers the frame was queued for.
    #[instrument(skip(self, event), fields(room_id = %event.room_id, kind = event.kind()))]
    pub async fn broadcast(&self, event: RoomEvent) -> usize {
        let frame = match event.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to serialize room event");
                return 0;
            }
        };

        let mut delivered = 0;
        let visited = self
            .registry
            .for_each_subscriber(&event.room_id, |subscriber| {
                match subscriber.try_deliver(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        warn!(
                            subscriber_id = %subscriber.id(),
                            error = %e,
                            "Failed to deliver event to subscriber, cancelling it"
                        );
                        subscriber.cancel();
                    }
                }
            })
            .await;

        if visited == 0 {
            debug!("No subscribers for room");
        } else {
            debug!(
                subscribers = visited,
                delivered = delivered,
                "Room event broadcast"
            );
        }

        delivered
    }

    /// Broadcast on a detached task.
    ///
    /// Callers that just committed a state change respond without waiting on
    /// fan-out; the task is never joined and its outcome is not observed.
    pub fn spawn_broadcast(&self, event: RoomEvent) {
        let broadcaster = self.clone();
        tokio::spawn(async move {
            broadcaster.broadcast(event).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websockets::registry::Subscriber;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    async fn add_subscriber(
        registry: &SubscriptionRegistry,
        room_id: &str,
        capacity: usize,
    ) -> (Subscriber, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let subscriber = Subscriber::new(tx, CancellationToken::new());
        registry.register(room_id, subscriber.clone()).await;
        (subscriber, rx)
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_room_is_noop() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone());

        let delivered = broadcaster
            .broadcast(RoomEvent::message_answered("nobody-here", "m1"))
            .await;

        assert_eq!(delivered, 0);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_full_queue_cancels_only_that_subscriber() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone());
        let (slow, _slow_rx) = add_subscriber(&registry, "room-1", 1).await;
        let (healthy, mut healthy_rx) = add_subscriber(&registry, "room-1", 8).await;

        broadcaster
            .broadcast(RoomEvent::reaction_increased("room-1", "m1", 1))
            .await;
        let delivered = broadcaster
            .broadcast(RoomEvent::reaction_increased("room-1", "m1", 2))
            .await;

        assert_eq!(delivered, 1);
        assert!(slow.is_cancelled());
        assert!(!healthy.is_cancelled());
        assert!(healthy_rx.recv().await.unwrap().contains("\"react_count\":1"));
        assert!(healthy_rx.recv().await.unwrap().contains("\"react_count\":2"));
    }

    #[tokio::test]
    async fn test_spawn_broadcast_delivers_without_join() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone());
        let (_subscriber, mut rx) = add_subscriber(&registry, "room-1", 8).await;

        broadcaster.spawn_broadcast(RoomEvent::message_created("room-1", "m1", "hello"));

        let frame = rx.recv().await.unwrap();
        assert_eq!(
            frame,
            r#"{"kind":"message_created","value":{"id":"m1","message":"hello"}}"#
        );
    }
}
