//! Ledgerline API server entry point.

use std::sync::Arc;

use ledgerline_api::config::{AppConfig, EventStoreConfig};
use ledgerline_api::error::AppError;
use ledgerline_api::routes;
use ledgerline_api::state::AppState;
use ledgerline_core::clock::SystemClock;
use ledgerline_core::repository::EventRepository;
use ledgerline_event_store::in_memory_event_store::InMemoryEventStore;
use ledgerline_event_store::pg_event_store::PgEventStore;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

async fn build_event_store(
    config: &EventStoreConfig,
) -> Result<Arc<dyn EventRepository>, AppError> {
    match config {
        EventStoreConfig::Memory => {
            tracing::warn!("using in-memory event store; events are lost on shutdown");
            Ok(Arc::new(InMemoryEventStore::new()))
        }
        EventStoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await?;
            let store = PgEventStore::new(pool);
            store.ensure_schema().await?;
            tracing::info!(max_connections, "connected to PostgreSQL event store");
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Ledgerline API server");

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;

    let event_repository = build_event_store(&config.event_store).await?;
    let app_state = AppState::new(
        Arc::new(SystemClock),
        event_repository,
        config.conflict_policy(),
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
