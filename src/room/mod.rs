// Public API - what other modules can use
pub use handlers::{
    create_message, create_room, get_message, list_messages, list_rooms, mark_message_answered,
    react_to_message, remove_reaction_from_message,
};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
mod types;

use uuid::Uuid;

use crate::shared::AppError;

/// Parses a path id, mapping malformed input to a 400 with `error_message`
pub fn parse_id(raw: &str, error_message: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(error_message.to_string()))
}
