use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::config::ConnectionSettings;
use crate::room::repository::RoomRepository;
use crate::websockets::{Broadcaster, SubscriptionRegistry};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_repository: Arc<dyn RoomRepository + Send + Sync>,
    pub registry: Arc<SubscriptionRegistry>,
    pub broadcaster: Broadcaster,
    pub connection_settings: ConnectionSettings,
    /// Root of every subscriber's cancellation token; cancelled on shutdown
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        connection_settings: ConnectionSettings,
        shutdown: CancellationToken,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry));

        Self {
            room_repository,
            registry,
            broadcaster,
            connection_settings,
            shutdown,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Database error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "something went wrong".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
