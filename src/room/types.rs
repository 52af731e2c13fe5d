use serde::{Deserialize, Serialize};

use super::models::{MessageModel, RoomModel};

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
pub struct RoomCreateRequest {
    pub theme: String,
}

/// Request payload for asking a question in a room
#[derive(Debug, Deserialize)]
pub struct MessageCreateRequest {
    pub message: String,
}

/// Response carrying only the id of a created resource
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub theme: String,
}

impl From<RoomModel> for RoomResponse {
    fn from(room: RoomModel) -> Self {
        Self {
            id: room.id.to_string(),
            theme: room.theme,
        }
    }
}

/// Full message as listed for a room
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub room_id: String,
    pub message: String,
    pub reaction_count: i64,
    pub answered: bool,
}

impl From<MessageModel> for MessageResponse {
    fn from(message: MessageModel) -> Self {
        Self {
            id: message.id.to_string(),
            room_id: message.room_id.to_string(),
            message: message.message,
            reaction_count: message.reaction_count,
            answered: message.answered,
        }
    }
}

/// Single message lookup response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageSummaryResponse {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub react_count: i64,
}
