#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ama::{
    websockets::TerminationReason, Broadcaster, ConnectionSettings, SubscriptionConnection,
    SubscriptionRegistry,
};

use super::mocks::{mock_connection, MockClient};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A registry and broadcaster plus helpers to attach mock subscribers
pub struct TestRoom {
    pub registry: Arc<SubscriptionRegistry>,
    pub broadcaster: Broadcaster,
    pub shutdown: CancellationToken,
    pub room_id: String,
    settings: ConnectionSettings,
}

/// A running mock subscription
pub struct TestSubscriber {
    pub client: MockClient,
    pub handle: JoinHandle<TerminationReason>,
}

impl TestSubscriber {
    /// Wait for the connection task to finish
    pub async fn finished(self) -> TerminationReason {
        tokio::time::timeout(Duration::from_secs(2), self.handle)
            .await
            .expect("subscription should end")
            .expect("subscription task should not panic")
    }
}

pub struct TestRoomBuilder {
    room_id: String,
    settings: ConnectionSettings,
}

impl TestRoomBuilder {
    pub fn new() -> Self {
        Self {
            room_id: "R1".to_string(),
            settings: ConnectionSettings::default(),
        }
    }

    pub fn with_room_id(mut self, room_id: &str) -> Self {
        self.room_id = room_id.to_string();
        self
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.settings.write_timeout = write_timeout;
        self
    }

    pub fn with_outbound_buffer(mut self, outbound_buffer: usize) -> Self {
        self.settings.outbound_buffer = outbound_buffer;
        self
    }

    pub fn build(self) -> TestRoom {
        let registry = Arc::new(SubscriptionRegistry::new());
        TestRoom {
            broadcaster: Broadcaster::new(registry.clone()),
            registry,
            shutdown: CancellationToken::new(),
            room_id: self.room_id,
            settings: self.settings,
        }
    }
}

impl TestRoom {
    /// Subscribe a new mock client to this room and wait until it is registered
    pub async fn connect(&self) -> TestSubscriber {
        self.connect_to(&self.room_id).await
    }

    /// Subscribe a new mock client to another room sharing the same registry
    pub async fn connect_to(&self, room_id: &str) -> TestSubscriber {
        let before = self.registry.subscriber_count(room_id).await;
        let (socket, client) = mock_connection();

        let connection = SubscriptionConnection::new(
            room_id.to_string(),
            Box::new(socket),
            self.registry.clone(),
            self.settings,
            &self.shutdown,
        );
        let handle = tokio::spawn(connection.run());

        self.wait_for_subscribers(room_id, before + 1).await;
        TestSubscriber { client, handle }
    }

    pub async fn wait_for_subscribers(&self, room_id: &str, expected: usize) {
        let registry = self.registry.clone();
        let waited = tokio::time::timeout(Duration::from_secs(1), async move {
            while registry.subscriber_count(room_id).await != expected {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "room {} never reached {} subscribers",
            room_id,
            expected
        );
    }
}
