use axum::{
    http::Method,
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::room;
use crate::shared::AppState;
use crate::websockets::websocket_handler;

/// Builds the full HTTP surface: the subscribe endpoint plus the room API
pub fn api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(300));

    Router::new()
        .route("/subscribe/:room_id", get(websocket_handler))
        .route("/api/rooms", get(room::list_rooms).post(room::create_room))
        .route(
            "/api/rooms/:room_id/messages",
            get(room::list_messages).post(room::create_message),
        )
        .route(
            "/api/rooms/:room_id/messages/:message_id",
            get(room::get_message),
        )
        .route(
            "/api/rooms/:room_id/messages/:message_id/react",
            patch(room::react_to_message).delete(room::remove_reaction_from_message),
        )
        .route(
            "/api/rooms/:room_id/messages/:message_id/answer",
            patch(room::mark_message_answered),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
