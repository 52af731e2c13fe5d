use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::models::{MessageModel, RoomModel};
use crate::shared::AppError;

/// Trait for room and message storage.
///
/// Every mutating call commits before returning; callers broadcast the
/// resulting event only after a successful return.
#[async_trait]
pub trait RoomRepository {
    async fn insert_room(&self, theme: &str) -> Result<Uuid, AppError>;
    async fn get_rooms(&self) -> Result<Vec<RoomModel>, AppError>;
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError>;

    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError>;
    async fn get_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError>;
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError>;

    /// Adds one reaction, returning the new total
    async fn react_to_message(&self, message_id: Uuid) -> Result<i64, AppError>;

    /// Removes one reaction, returning the new total. Never drops below zero.
    async fn remove_reaction_from_message(&self, message_id: Uuid) -> Result<i64, AppError>;

    async fn mark_message_as_answered(&self, message_id: Uuid) -> Result<(), AppError>;
}

fn message_not_found() -> AppError {
    AppError::BadRequest("message not found".to_string())
}

#[derive(Default)]
struct InMemoryTables {
    rooms: Vec<RoomModel>,
    messages: Vec<MessageModel>,
}

impl InMemoryTables {
    fn message_mut(&mut self, message_id: Uuid) -> Result<&mut MessageModel, AppError> {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(message_not_found)
    }
}

/// In-memory implementation of RoomRepository for development and testing
///
/// Data is kept in insertion order and lost when the process exits.
pub struct InMemoryRoomRepository {
    tables: Mutex<InMemoryTables>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(InMemoryTables::default()),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, InMemoryTables>, AppError> {
        self.tables.lock().map_err(|_| {
            error!("In-memory room store lock poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self))]
    async fn insert_room(&self, theme: &str) -> Result<Uuid, AppError> {
        let room = RoomModel::new(theme.to_string());
        let room_id = room.id;
        self.tables()?.rooms.push(room);

        debug!(room_id = %room_id, "Room created in memory");
        Ok(room_id)
    }

    #[instrument(skip(self))]
    async fn get_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        Ok(self.tables()?.rooms.clone())
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        let room = self
            .tables()?
            .rooms
            .iter()
            .find(|r| r.id == room_id)
            .cloned();

        if room.is_none() {
            debug!(room_id = %room_id, "Room not found in memory");
        }
        Ok(room)
    }

    #[instrument(skip(self, message))]
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError> {
        let mut tables = self.tables()?;
        if !tables.rooms.iter().any(|r| r.id == room_id) {
            warn!(room_id = %room_id, "Cannot insert message into missing room");
            return Err(AppError::BadRequest("room not found".to_string()));
        }

        let model = MessageModel::new(room_id, message.to_string());
        let message_id = model.id;
        tables.messages.push(model);

        debug!(room_id = %room_id, message_id = %message_id, "Message created in memory");
        Ok(message_id)
    }

    #[instrument(skip(self))]
    async fn get_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        Ok(self
            .tables()?
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        Ok(self
            .tables()?
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn react_to_message(&self, message_id: Uuid) -> Result<i64, AppError> {
        let mut tables = self.tables()?;
        let message = tables.message_mut(message_id)?;
        message.reaction_count += 1;
        Ok(message.reaction_count)
    }

    #[instrument(skip(self))]
    async fn remove_reaction_from_message(&self, message_id: Uuid) -> Result<i64, AppError> {
        let mut tables = self.tables()?;
        let message = tables.message_mut(message_id)?;
        message.reaction_count = (message.reaction_count - 1).max(0);
        Ok(message.reaction_count)
    }

    #[instrument(skip(self))]
    async fn mark_message_as_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        tables.message_mut(message_id)?.answered = true;
        Ok(())
    }
}

/// PostgreSQL implementation of RoomRepository for production
pub struct PostgresRoomRepository {
    pool: PgPool,
}

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Room store query failed");
    AppError::DatabaseError(e.to_string())
}

impl PostgresRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the rooms and messages tables if they are missing
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rooms (
                id UUID PRIMARY KEY NOT NULL,
                theme VARCHAR(255) NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id UUID PRIMARY KEY NOT NULL,
                room_id UUID NOT NULL REFERENCES rooms (id),
                message VARCHAR(255) NOT NULL,
                reaction_count BIGINT NOT NULL DEFAULT 0,
                answered BOOLEAN NOT NULL DEFAULT false
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        debug!("Room store schema ready");
        Ok(())
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    #[instrument(skip(self))]
    async fn insert_room(&self, theme: &str) -> Result<Uuid, AppError> {
        let room_id = Uuid::new_v4();
        sqlx::query("INSERT INTO rooms (id, theme) VALUES ($1, $2)")
            .bind(room_id)
            .bind(theme)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        debug!(room_id = %room_id, "Room created in database");
        Ok(room_id)
    }

    #[instrument(skip(self))]
    async fn get_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        sqlx::query_as::<_, RoomModel>("SELECT id, theme FROM rooms")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        sqlx::query_as::<_, RoomModel>("SELECT id, theme FROM rooms WHERE id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)
    }

    #[instrument(skip(self, message))]
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError> {
        let message_id = Uuid::new_v4();
        sqlx::query("INSERT INTO messages (id, room_id, message) VALUES ($1, $2, $3)")
            .bind(message_id)
            .bind(room_id)
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        debug!(room_id = %room_id, message_id = %message_id, "Message created in database");
        Ok(message_id)
    }

    #[instrument(skip(self))]
    async fn get_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered FROM messages WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered FROM messages WHERE id = $1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)
    }

    #[instrument(skip(self))]
    async fn react_to_message(&self, message_id: Uuid) -> Result<i64, AppError> {
        let row = sqlx::query(
            "UPDATE messages SET reaction_count = reaction_count + 1 WHERE id = $1 RETURNING reaction_count",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(|r| r.get::<i64, _>("reaction_count"))
            .ok_or_else(message_not_found)
    }

    #[instrument(skip(self))]
    async fn remove_reaction_from_message(&self, message_id: Uuid) -> Result<i64, AppError> {
        let row = sqlx::query(
            "UPDATE messages SET reaction_count = GREATEST(reaction_count - 1, 0) WHERE id = $1 RETURNING reaction_count",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(|r| r.get::<i64, _>("reaction_count"))
            .ok_or_else(message_not_found)
    }

    #[instrument(skip(self))]
    async fn mark_message_as_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE messages SET answered = true WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(message_not_found());
        }
        Ok(())
    }
}
