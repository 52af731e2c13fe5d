use serde::{Deserialize, Serialize};

/// Payload delivered to subscribers, one JSON object per event.
///
/// Serialized as `{"kind": "<kind>", "value": {...}}`. The field names are
/// part of the client contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventPayload {
    /// A new question was stored
    MessageCreated { id: String, message: String },

    /// A question was marked answered
    MessageAnswered { id: String },

    /// A reaction was added; `react_count` is the new total
    MessageReactionIncreased { id: String, react_count: i64 },

    /// A reaction was removed; `react_count` is the new total
    MessageReactionDecreased { id: String, react_count: i64 },
}

impl EventPayload {
    /// Wire tag for this payload
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::MessageCreated { .. } => "message_created",
            EventPayload::MessageAnswered { .. } => "message_answered",
            EventPayload::MessageReactionIncreased { .. } => "message_reaction_increased",
            EventPayload::MessageReactionDecreased { .. } => "message_reaction_decreased",
        }
    }
}

/// A state change addressed to every subscriber of one room.
///
/// Events are transient: they are never stored or queued for subscribers
/// that are not connected at broadcast time.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomEvent {
    /// Routing key only, never sent to subscribers
    pub room_id: String,
    pub payload: EventPayload,
}

impl RoomEvent {
    pub fn new(room_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            room_id: room_id.into(),
            payload,
        }
    }

    pub fn message_created(
        room_id: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageCreated {
                id: id.into(),
                message: message.into(),
            },
        )
    }

    pub fn message_answered(room_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(room_id, EventPayload::MessageAnswered { id: id.into() })
    }

    pub fn reaction_increased(
        room_id: impl Into<String>,
        id: impl Into<String>,
        react_count: i64,
    ) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageReactionIncreased {
                id: id.into(),
                react_count,
            },
        )
    }

    pub fn reaction_decreased(
        room_id: impl Into<String>,
        id: impl Into<String>,
        react_count: i64,
    ) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageReactionDecreased {
                id: id.into(),
                react_count,
            },
        )
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }

    /// Serialize the subscriber-facing frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}
