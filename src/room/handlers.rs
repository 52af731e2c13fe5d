use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    parse_id,
    service::RoomService,
    types::{
        CreatedResponse, MessageCreateRequest, MessageResponse, MessageSummaryResponse,
        ReactionResponse, RoomCreateRequest, RoomResponse,
    },
};
use crate::shared::{AppError, AppState};

fn room_service(state: &AppState) -> RoomService {
    RoomService::new(
        Arc::clone(&state.room_repository),
        state.broadcaster.clone(),
    )
}

/// HTTP handler for creating a new room
///
/// POST /api/rooms
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<CreatedResponse>, AppError> {
    let room_id = room_service(&state).create_room(&request.theme).await?;

    Ok(Json(CreatedResponse {
        id: room_id.to_string(),
    }))
}

/// HTTP handler for listing all rooms
///
/// GET /api/rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = room_service(&state).list_rooms().await?;

    info!(room_count = rooms.len(), "Rooms listed successfully");

    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

/// POST /api/rooms/{room_id}/messages
#[instrument(name = "create_message", skip(state, request))]
pub async fn create_message(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<MessageCreateRequest>,
) -> Result<Json<CreatedResponse>, AppError> {
    let room_id = parse_id(&room_id, "invalid room id")?;
    let message_id = room_service(&state)
        .create_message(room_id, request.message)
        .await?;

    Ok(Json(CreatedResponse {
        id: message_id.to_string(),
    }))
}

/// GET /api/rooms/{room_id}/messages
#[instrument(name = "list_messages", skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let room_id = parse_id(&room_id, "invalid room id")?;
    let messages = room_service(&state).list_messages(room_id).await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// GET /api/rooms/{room_id}/messages/{message_id}
#[instrument(name = "get_message", skip(state))]
pub async fn get_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<MessageSummaryResponse>, AppError> {
    let room_id = parse_id(&room_id, "invalid room id")?;
    let message_id = parse_id(&message_id, "invalid message id")?;
    let message = room_service(&state)
        .require_message(room_id, message_id)
        .await?;

    Ok(Json(MessageSummaryResponse {
        id: message.id.to_string(),
        message: message.message,
    }))
}

/// PATCH /api/rooms/{room_id}/messages/{message_id}/react
#[instrument(name = "react_to_message", skip(state))]
pub async fn react_to_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<ReactionResponse>, AppError> {
    let room_id = parse_id(&room_id, "invalid room id")?;
    let message_id = parse_id(&message_id, "invalid message id")?;

    Ok(Json(room_service(&state).react(room_id, message_id).await?))
}

/// DELETE /api/rooms/{room_id}/messages/{message_id}/react
#[instrument(name = "remove_reaction_from_message", skip(state))]
pub async fn remove_reaction_from_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<Json<ReactionResponse>, AppError> {
    let room_id = parse_id(&room_id, "invalid room id")?;
    let message_id = parse_id(&message_id, "invalid message id")?;

    Ok(Json(
        room_service(&state)
            .remove_reaction(room_id, message_id)
            .await?,
    ))
}

/// PATCH /api/rooms/{room_id}/messages/{message_id}/answer
#[instrument(name = "mark_message_answered", skip(state))]
pub async fn mark_message_answered(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let room_id = parse_id(&room_id, "invalid room id")?;
    let message_id = parse_id(&message_id, "invalid message id")?;
    room_service(&state)
        .mark_answered(room_id, message_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
