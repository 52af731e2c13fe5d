use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::{Subscriber, SubscriptionRegistry};
use crate::config::ConnectionSettings;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("send timed out")]
    SendTimedOut,
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Pings are answered by axum; binary frames carry nothing for us
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// Why a subscription ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The client closed the connection or the stream ended
    ClientClosed,
    /// The subscriber's token was cancelled: failed delivery or shutdown
    Cancelled,
    /// Reading from or writing to the socket failed
    SocketFailed,
}

/// One subscribed connection, from registration to teardown
pub struct SubscriptionConnection {
    room_id: String,
    socket: Box<dyn SocketWrapper>,
    registry: Arc<SubscriptionRegistry>,
    settings: ConnectionSettings,
    cancel: CancellationToken,
}

impl SubscriptionConnection {
    /// `parent` is the cancellation scope the subscription lives under; the
    /// subscriber's own token is a child of it
    pub fn new(
        room_id: String,
        socket: Box<dyn SocketWrapper>,
        registry: Arc<SubscriptionRegistry>,
        settings: ConnectionSettings,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            room_id,
            socket,
            registry,
            settings,
            cancel: parent.child_token(),
        }
    }

    /// Register, pump frames until cancelled, deregister, close.
    ///
    /// Returns only after the subscriber has been removed from the registry.
    pub async fn run(mut self) -> TerminationReason {
        let (outbound_sender, mut outbound_receiver) =
            mpsc::channel::<String>(self.settings.outbound_buffer);
        let subscriber = Subscriber::new(outbound_sender, self.cancel.clone());
        let subscriber_id = subscriber.id();

        self.registry.register(&self.room_id, subscriber).await;

        let cancel = self.cancel.clone();
        let reason = loop {
            tokio::select! {
                _ = cancel.cancelled() => break TerminationReason::Cancelled,

                frame = outbound_receiver.recv() => {
                    // The registry holds a sender until deregistration, so
                    // the queue cannot close first
                    let Some(frame) = frame else {
                        break TerminationReason::Cancelled;
                    };

                    let write = tokio::time::timeout(
                        self.settings.write_timeout,
                        self.socket.send_message(frame),
                    );
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break TerminationReason::Cancelled,
                        outcome = write => outcome.unwrap_or(Err(SocketError::SendTimedOut)),
                    };

                    if let Err(e) = outcome {
                        warn!(
                            room_id = %self.room_id,
                            subscriber_id = %subscriber_id,
                            error = %e,
                            "Failed to write event to subscriber"
                        );
                        break TerminationReason::SocketFailed;
                    }
                }

                inbound = self.socket.receive_message() => {
                    match inbound {
                        Ok(Some(message)) => {
                            debug!(
                                room_id = %self.room_id,
                                subscriber_id = %subscriber_id,
                                bytes = message.len(),
                                "Ignoring inbound message from subscriber"
                            );
                        }
                        Ok(None) => break TerminationReason::ClientClosed,
                        Err(e) => {
                            warn!(
                                room_id = %self.room_id,
                                subscriber_id = %subscriber_id,
                                error = %e,
                                "Subscriber connection error"
                            );
                            break TerminationReason::SocketFailed;
                        }
                    }
                }
            }
        };

        self.cancel.cancel();
        self.registry.deregister(&self.room_id, subscriber_id).await;

        // A peer that stopped reading blocks the close frame too
        if reason != TerminationReason::ClientClosed {
            match tokio::time::timeout(self.settings.write_timeout, self.socket.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(
                    room_id = %self.room_id,
                    subscriber_id = %subscriber_id,
                    error = %e,
                    "Failed to close subscriber socket"
                ),
                Err(_) => debug!(
                    room_id = %self.room_id,
                    subscriber_id = %subscriber_id,
                    "Timed out closing subscriber socket"
                ),
            }
        }

        info!(
            room_id = %self.room_id,
            subscriber_id = %subscriber_id,
            reason = ?reason,
            "Subscription ended"
        );

        reason
    }
}
