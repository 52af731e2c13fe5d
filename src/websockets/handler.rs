use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::room::parse_id;
use crate::shared::{AppError, AppState};

use super::socket::SubscriptionConnection;

/// WebSocket endpoint that subscribes the caller to a room's events
/// GET /subscribe/{room_id}
///
/// The room must exist before the upgrade happens; a missing room or a
/// request that cannot be upgraded is refused with 400 and no subscriber is
/// ever created.
#[instrument(name = "subscribe", skip(ws, app_state))]
pub async fn websocket_handler(
    ws: Option<WebSocketUpgrade>,
    Path(room_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    info!(room_id = %room_id, "WebSocket subscription requested");

    let parsed_room_id = parse_id(&room_id, "invalid room id")?;

    if app_state
        .room_repository
        .get_room(parsed_room_id)
        .await?
        .is_none()
    {
        warn!(room_id = %room_id, "Room not found, rejecting WebSocket connection");
        return Err(AppError::BadRequest("room not found".to_string()));
    }

    let Some(ws) = ws else {
        warn!(room_id = %room_id, "Request is not a WebSocket upgrade");
        return Err(AppError::BadRequest(
            "failed to upgrade to ws connection".to_string(),
        ));
    };

    // Normalized form is the registry key, matching what the room routes emit to
    let room_key = parsed_room_id.to_string();
    let registry = Arc::clone(&app_state.registry);
    let settings = app_state.connection_settings;
    let shutdown = app_state.shutdown.clone();

    Ok(ws
        .on_failed_upgrade(|e| {
            warn!(error = %e, "Failed to upgrade to WebSocket connection");
        })
        .on_upgrade(move |socket| async move {
            info!(room_id = %room_key, "New subscriber connected");

            let connection = SubscriptionConnection::new(
                room_key,
                Box::new(socket),
                registry,
                settings,
                &shutdown,
            );
            connection.run().await;
        }))
}
