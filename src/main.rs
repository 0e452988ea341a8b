//! Fraudguard server entry point
//!
//! Startup sequence: logging -> config -> database -> artifacts -> serve.
//! The encoding table is required (fail fast); a missing model degrades the
//! service to 503 on the prediction route instead of aborting startup.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fraudguard::inference::{FraudClassifier, FraudModel};
use fraudguard::{config, create_router, db, inference::EncodingTable, AppState};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fraudguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Fraudguard server starting...");
    tracing::info!("Database: {}", config.database_url);
    tracing::info!("Flag schema: {}", config.flag_schema.as_str());

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&pool)
        .await
        .expect("Failed to apply database schema");

    // Load artifacts. The encoding table is required; the model may be
    // absent, in which case predictions answer 503 until a restart.
    let encoder = EncodingTable::load(&config.encoding_map_path)
        .expect("Failed to load encoding table artifact");

    let model = FraudClassifier::load(&config.model_path);
    if !model.is_loaded() {
        tracing::warn!(
            "Serving without a fraud model; prediction requests will fail with 503"
        );
    }

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
        encoder: Arc::new(encoder),
        model: Arc::new(model),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
