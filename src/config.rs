//! Configuration module

use std::env;

use crate::models::flags::FlagSchema;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server port
    pub port: u16,

    /// JWT secret key
    pub jwt_secret: String,

    /// JWT expiration in hours
    pub jwt_expiration_hours: u64,

    /// Path to the ONNX fraud model artifact
    pub model_path: String,

    /// Path to the categorical encoding table artifact
    pub encoding_map_path: String,

    /// Which wire names the six failure flags use (`generic` or `named`)
    pub flag_schema: FlagSchema,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://fraudguard.db".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "fraudguard-dev-secret-change-in-production".to_string()),

            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),

            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| "artifacts/fraud_model.onnx".to_string()),

            encoding_map_path: env::var("ENCODING_MAP_PATH")
                .unwrap_or_else(|_| "artifacts/encoding_map.json".to_string()),

            flag_schema: env::var("FLAG_SCHEMA")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
