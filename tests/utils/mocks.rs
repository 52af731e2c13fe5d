//! Scripted socket standing in for a real WebSocket client
#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use ama::websockets::{SocketError, SocketWrapper};

// ============================================================================
// Mock Infrastructure
// ============================================================================

enum ClientAction {
    Text(String),
    Close,
    Error,
}

/// Server side of a mock connection, handed to the subscription under test
pub struct MockSocket {
    frames: mpsc::UnboundedSender<String>,
    actions: mpsc::UnboundedReceiver<ClientAction>,
    fail_sends: Arc<AtomicBool>,
    stall_sends: Arc<AtomicBool>,
    stall_close: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

/// Client side of a mock connection, kept by the test
pub struct MockClient {
    frames: mpsc::UnboundedReceiver<String>,
    actions: mpsc::UnboundedSender<ClientAction>,
    fail_sends: Arc<AtomicBool>,
    stall_sends: Arc<AtomicBool>,
    stall_close: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

pub fn mock_connection() -> (MockSocket, MockClient) {
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let fail_sends = Arc::new(AtomicBool::new(false));
    let stall_sends = Arc::new(AtomicBool::new(false));
    let stall_close = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));

    let socket = MockSocket {
        frames: frame_tx,
        actions: action_rx,
        fail_sends: fail_sends.clone(),
        stall_sends: stall_sends.clone(),
        stall_close: stall_close.clone(),
        closed: closed.clone(),
    };
    let client = MockClient {
        frames: frame_rx,
        actions: action_tx,
        fail_sends,
        stall_sends,
        stall_close,
        closed,
    };
    (socket, client)
}

#[async_trait]
impl SocketWrapper for MockSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        if self.stall_sends.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SocketError::SendFailed("broken pipe".to_string()));
        }
        self.frames
            .send(message)
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        match self.actions.recv().await {
            Some(ClientAction::Text(text)) => Ok(Some(text)),
            Some(ClientAction::Close) | None => Ok(None),
            Some(ClientAction::Error) => {
                Err(SocketError::ReceiveFailed("connection reset".to_string()))
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        if self.stall_close.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MockClient {
    /// Every write the server attempts from now on fails
    pub fn break_connection(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Every write the server attempts from now on never completes
    pub fn stall_connection(&self) {
        self.stall_sends.store(true, Ordering::SeqCst);
    }

    /// The server's close frame never completes either
    pub fn stall_close(&self) {
        self.stall_close.store(true, Ordering::SeqCst);
    }

    pub fn send_text(&self, text: &str) {
        let _ = self.actions.send(ClientAction::Text(text.to_string()));
    }

    /// Client sends a close frame
    pub fn close(&self) {
        let _ = self.actions.send(ClientAction::Close);
    }

    /// The transport reports a read error
    pub fn reset(&self) {
        let _ = self.actions.send(ClientAction::Error);
    }

    /// Whether the server sent a close frame
    pub fn was_closed_by_server(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn next_frame(&mut self) -> Option<String> {
        tokio::time::timeout(std::time::Duration::from_secs(1), self.frames.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn try_next_frame(&mut self) -> Option<String> {
        self.frames.try_recv().ok()
    }
}
