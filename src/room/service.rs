use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::{MessageModel, RoomModel},
    repository::RoomRepository,
    types::ReactionResponse,
};
use crate::shared::AppError;
use crate::websockets::{Broadcaster, RoomEvent};

/// Room and question operations.
///
/// Each state change commits to the repository first, then hands the event
/// to the broadcaster on a detached task. The caller's result never depends
/// on fan-out.
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    broadcaster: Broadcaster,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>, broadcaster: Broadcaster) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_room(&self, theme: &str) -> Result<Uuid, AppError> {
        let room_id = self.repository.insert_room(theme).await?;
        info!(room_id = %room_id, "Room created successfully");
        Ok(room_id)
    }

    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        self.repository.get_rooms().await
    }

    /// Fails with "room not found" unless the room exists
    pub async fn require_room(&self, room_id: Uuid) -> Result<RoomModel, AppError> {
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("room not found".to_string()))
    }

    /// Fails with "message not found" unless the message exists in this room
    pub async fn require_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<MessageModel, AppError> {
        self.require_room(room_id).await?;
        self.repository
            .get_message(message_id)
            .await?
            .filter(|message| message.room_id == room_id)
            .ok_or_else(|| AppError::BadRequest("message not found".to_string()))
    }

    #[instrument(skip(self, message))]
    pub async fn create_message(&self, room_id: Uuid, message: String) -> Result<Uuid, AppError> {
        self.require_room(room_id).await?;
        let message_id = self.repository.insert_message(room_id, &message).await?;

        info!(room_id = %room_id, message_id = %message_id, "Message created");
        self.broadcaster.spawn_broadcast(RoomEvent::message_created(
            room_id.to_string(),
            message_id.to_string(),
            message,
        ));

        Ok(message_id)
    }

    #[instrument(skip(self))]
    pub async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        self.require_room(room_id).await?;
        let messages = self.repository.get_room_messages(room_id).await?;
        debug!(room_id = %room_id, message_count = messages.len(), "Messages listed");
        Ok(messages)
    }

    #[instrument(skip(self))]
    pub async fn react(&self, room_id: Uuid, message_id: Uuid) -> Result<ReactionResponse, AppError> {
        self.require_message(room_id, message_id).await?;
        let react_count = self.repository.react_to_message(message_id).await?;

        debug!(message_id = %message_id, react_count = react_count, "Reaction added");
        self.broadcaster.spawn_broadcast(RoomEvent::reaction_increased(
            room_id.to_string(),
            message_id.to_string(),
            react_count,
        ));

        Ok(ReactionResponse { react_count })
    }

    #[instrument(skip(self))]
    pub async fn remove_reaction(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<ReactionResponse, AppError> {
        self.require_message(room_id, message_id).await?;
        let react_count = self
            .repository
            .remove_reaction_from_message(message_id)
            .await?;

        debug!(message_id = %message_id, react_count = react_count, "Reaction removed");
        self.broadcaster.spawn_broadcast(RoomEvent::reaction_decreased(
            room_id.to_string(),
            message_id.to_string(),
            react_count,
        ));

        Ok(ReactionResponse { react_count })
    }

    #[instrument(skip(self))]
    pub async fn mark_answered(&self, room_id: Uuid, message_id: Uuid) -> Result<(), AppError> {
        self.require_message(room_id, message_id).await?;
        self.repository.mark_message_as_answered(message_id).await?;

        info!(message_id = %message_id, "Message marked as answered");
        self.broadcaster.spawn_broadcast(RoomEvent::message_answered(
            room_id.to_string(),
            message_id.to_string(),
        ));

        Ok(())
    }
}
