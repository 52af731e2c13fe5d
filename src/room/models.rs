use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for rooms table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RoomModel {
    pub id: Uuid,
    pub theme: String, // Topic of the AMA session
}

impl RoomModel {
    /// Creates a new room model with a generated ID
    pub fn new(theme: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            theme,
        }
    }
}

/// Database model for messages table: one question asked in a room
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct MessageModel {
    pub id: Uuid,
    pub room_id: Uuid,
    pub message: String,
    pub reaction_count: i64,
    pub answered: bool,
}

impl MessageModel {
    pub fn new(room_id: Uuid, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            message,
            reaction_count: 0,
            answered: false,
        }
    }
}
