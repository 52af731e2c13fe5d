// Public API
pub use broadcaster::Broadcaster;
pub use handler::websocket_handler;
pub use messages::{EventPayload, RoomEvent};
pub use registry::{DeliveryError, Subscriber, SubscriberId, SubscriptionRegistry};
pub use socket::{SocketError, SocketWrapper, SubscriptionConnection, TerminationReason};

// Internal modules
mod broadcaster;
mod handler;
mod messages;
mod registry;
mod socket;
