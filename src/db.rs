//! Database module - SQLite connection and schema setup

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
}

/// Apply the schema. Idempotent, runs on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
///
/// The six failure flags are stored by slot (`error_0..error_5`); the wire
/// names are resolved per the configured flag schema (see `models::flags`).
const SCHEMA_SQL: &str = r#"
-- Transaction records (immutable once inserted)
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NOT NULL,
    card_id INTEGER NOT NULL,
    amount REAL NOT NULL,
    use_chip TEXT NOT NULL,
    merchant_id INTEGER NOT NULL,
    merchant_city TEXT NOT NULL,
    merchant_state TEXT NOT NULL,
    zip REAL NOT NULL,
    mcc INTEGER NOT NULL,
    hour INTEGER NOT NULL,
    dayofweek INTEGER NOT NULL,
    is_weekend INTEGER NOT NULL,
    error_0 INTEGER NOT NULL DEFAULT 0,
    error_1 INTEGER NOT NULL DEFAULT 0,
    error_2 INTEGER NOT NULL DEFAULT 0,
    error_3 INTEGER NOT NULL DEFAULT 0,
    error_4 INTEGER NOT NULL DEFAULT 0,
    error_5 INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- Users
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    last_login TEXT,
    created_at TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_transactions_client ON transactions(client_id);
CREATE INDEX IF NOT EXISTS idx_transactions_merchant ON transactions(merchant_id);
"#;
