//! Test assertion helpers for subscriber frames
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use super::mocks::MockClient;

pub struct FrameAssertion<'a> {
    client: &'a mut MockClient,
    label: &'a str,
}

impl<'a> FrameAssertion<'a> {
    pub fn for_client(client: &'a mut MockClient, label: &'a str) -> Self {
        Self { client, label }
    }

    /// Consume the next frame and compare it to the expected JSON document
    pub async fn received(self, expected: Value) -> Self {
        let frame = self.client.next_frame().await;
        assert!(frame.is_some(), "{} should have received a frame", self.label);

        let frame: Value = serde_json::from_str(&frame.unwrap()).unwrap();
        assert_eq!(frame, expected, "{} received the wrong frame", self.label);
        self
    }

    /// Assert that nothing further was written to this client
    pub async fn received_nothing_more(self) {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let frame = self.client.try_next_frame();
        assert!(
            frame.is_none(),
            "{} should not have received {:?}",
            self.label,
            frame
        );
    }
}
