use ama::{
    room::repository::PostgresRoomRepository, routes::api_router, AppState, InMemoryRoomRepository,
    RoomRepository, ServerConfig,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ama=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AMA server");

    let config = ServerConfig::from_env()?;

    let room_repository: Arc<dyn RoomRepository + Send + Sync> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresRoomRepository::new(pool);
            repository.ensure_schema().await?;
            info!("Using PostgreSQL room store");
            Arc::new(repository)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory room store");
            Arc::new(InMemoryRoomRepository::new())
        }
    };

    // Cancelling this token tears down every live subscription
    let shutdown = CancellationToken::new();
    let app_state = AppState::new(room_repository, config.connection, shutdown.clone());
    let registry = Arc::clone(&app_state.registry);
    let app = api_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Server listening");

    let signal_token = shutdown.clone();
    let signal_registry = Arc::clone(&registry);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal_registry.cancel_all().await;
                signal_token.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!(
        open_rooms = registry.room_count().await,
        "Server stopped"
    );
    Ok(())
}
