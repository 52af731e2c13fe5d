use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one subscribed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Why a frame could not be handed to a subscriber
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("subscriber outbound queue is full")]
    QueueFull,

    #[error("subscriber connection is gone")]
    Disconnected,
}

/// One live connection watching one room.
///
/// Frames go into a bounded queue drained by the connection task, which owns
/// the socket. Cloning is cheap; all clones share the queue and the token.
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,
    outbound: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl Subscriber {
    pub fn new(outbound: mpsc::Sender<String>, cancel: CancellationToken) -> Self {
        Self {
            id: SubscriberId::next(),
            outbound,
            cancel,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Trigger this subscriber's termination. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Enqueue a frame without waiting
    pub fn try_deliver(&self, frame: String) -> Result<(), DeliveryError> {
        if self.cancel.is_cancelled() {
            return Err(DeliveryError::Disconnected);
        }

        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected,
        })
    }
}

/// Table of room id -> currently subscribed connections.
///
/// Every operation runs under one exclusive lock over the whole table.
/// Broadcast delivery only enqueues while holding it, so the lock is never
/// held across a socket write.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    rooms: Mutex<HashMap<String, HashMap<SubscriberId, Subscriber>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Add a subscriber to a room, creating the room's set if needed
    pub async fn register(&self, room_id: &str, subscriber: Subscriber) {
        let mut rooms = self.rooms.lock().await;
        let subscribers = rooms.entry(room_id.to_string()).or_default();
        let subscriber_id = subscriber.id();
        subscribers.insert(subscriber_id, subscriber);

        info!(
            room_id = %room_id,
            subscriber_id = %subscriber_id,
            room_subscribers = subscribers.len(),
            "Subscriber registered"
        );
    }

    /// Remove a subscriber from a room.
    ///
    /// Removing an absent subscriber, or from a room with no entry, is a no-op.
    pub async fn deregister(&self, room_id: &str, subscriber_id: SubscriberId) {
        let mut rooms = self.rooms.lock().await;

        let Some(subscribers) = rooms.get_mut(room_id) else {
            debug!(room_id = %room_id, subscriber_id = %subscriber_id, "No subscribers for room");
            return;
        };

        if subscribers.remove(&subscriber_id).is_some() {
            info!(
                room_id = %room_id,
                subscriber_id = %subscriber_id,
                room_subscribers = subscribers.len(),
                "Subscriber deregistered"
            );
        } else {
            debug!(room_id = %room_id, subscriber_id = %subscriber_id, "Subscriber already removed");
        }

        if subscribers.is_empty() {
            rooms.remove(room_id);
        }
    }

    /// Point-in-time copy of a room's subscribers
    pub async fn snapshot(&self, room_id: &str) -> Vec<Subscriber> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|subscribers| subscribers.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Visit every subscriber of a room inside the exclusive section.
    ///
    /// Calls for the same room are serialized, so frames reach each queue in
    /// call order. `visit` must not block. Returns the number visited.
    pub async fn for_each_subscriber<F>(&self, room_id: &str, mut visit: F) -> usize
    where
        F: FnMut(&Subscriber),
    {
        let rooms = self.rooms.lock().await;
        match rooms.get(room_id) {
            Some(subscribers) => {
                subscribers.values().for_each(&mut visit);
                subscribers.len()
            }
            None => 0,
        }
    }

    pub async fn subscriber_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).map_or(0, HashMap::len)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Cancel every registered subscriber; each one deregisters itself as
    /// its connection task unwinds
    pub async fn cancel_all(&self) {
        let rooms = self.rooms.lock().await;
        let mut cancelled = 0;
        for subscriber in rooms.values().flat_map(HashMap::values) {
            subscriber.cancel();
            cancelled += 1;
        }
        info!(cancelled = cancelled, "Cancelled all subscriptions");
    }
}
