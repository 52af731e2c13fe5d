// Library crate for the AMA room server
// This file exposes the public API for integration tests

pub mod config;
pub mod room;
pub mod routes;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::{ConnectionSettings, ServerConfig};
pub use room::repository::{InMemoryRoomRepository, RoomRepository};
pub use shared::{AppError, AppState};
pub use websockets::{
    Broadcaster, EventPayload, RoomEvent, SocketWrapper, Subscriber, SubscriptionConnection,
    SubscriptionRegistry,
};
