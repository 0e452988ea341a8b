//! Fraudguard - transaction intake and fraud scoring API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        FRAUDGUARD                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌──────────────────────────┐  │
//! │  │  API      │  │  Auth     │  │  Inference               │  │
//! │  │  (Axum)   │  │  (JWT)    │  │  (Encoder -> ONNX model) │  │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬─────────────┘  │
//! │        └──────────────┼─────────────────────┘                │
//! │                       ▼                                      │
//! │                 ┌──────────┐                                 │
//! │                 │  SQLite  │                                 │
//! │                 └──────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction is submitted once, stored immutably, and scored on demand:
//! the orchestrator fetches the record, encodes its categorical fields
//! through a static lookup table, and runs the pre-trained binary
//! classifier. Predictions are computed per request and never stored.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod middleware;
pub mod models;

pub use error::{AppError, AppResult};

use inference::{EncodingTable, FraudModel};

/// Shared application state
///
/// The encoding table and the model are loaded once at startup and are
/// immutable afterwards; the pool is the only mutable shared resource.
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub config: config::Config,
    pub encoder: Arc<EncodingTable>,
    pub model: Arc<dyn FraudModel>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route(
            "/api/v1/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(handlers::auth::reset_password),
        );

    // Domain routes (user JWT auth)
    let domain_routes = Router::new()
        .route("/api/v1/transactions", post(handlers::transactions::submit))
        .route("/api/v1/transactions/:id", get(handlers::transactions::get))
        .route("/api/v1/predict/:id", get(handlers::predict::predict))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(domain_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
