//! Transaction handlers

use axum::http::StatusCode;
use axum::{
    extract::{Path, State},
    Json,
};

use crate::middleware::auth::UserContext;
use crate::models::{NewTransaction, Transaction, TransactionRecord};
use crate::{AppError, AppResult, AppState};

/// Submit a transaction. Validation happens before any side effect; a
/// rejected submission persists nothing.
pub async fn submit(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<NewTransaction>,
) -> AppResult<(StatusCode, Json<TransactionRecord>)> {
    let flags = payload.validate_against(state.config.flag_schema)?;

    let txn = Transaction::create(&state.pool, &payload, &flags).await?;

    tracing::info!(
        "Transaction {} stored (client {}, submitted by user {})",
        txn.id,
        txn.client_id,
        user.user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(txn.to_record(state.config.flag_schema)),
    ))
}

/// Get a stored transaction by id
pub async fn get(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<i64>,
) -> AppResult<Json<TransactionRecord>> {
    let txn = Transaction::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

    Ok(Json(txn.to_record(state.config.flag_schema)))
}
