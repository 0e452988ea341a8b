//! Inference orchestrator
//!
//! One request walks FETCH -> ENCODE -> CLASSIFY -> DONE. Any failure aborts
//! the request immediately; there are no retries between stages and no
//! partial results.

use serde::Serialize;
use sqlx::SqlitePool;

use super::encoding::{encode, EncodingTable};
use super::model::FraudModel;
use crate::error::AppError;
use crate::models::transaction::Transaction;

/// Binary verdict for one stored transaction. Computed on demand, never
/// persisted or cached.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub transaction_id: i64,
    /// 1 if fraud, 0 otherwise
    pub is_fraud: u8,
}

pub async fn predict_transaction(
    pool: &SqlitePool,
    table: &EncodingTable,
    model: &dyn FraudModel,
    transaction_id: i64,
) -> Result<Prediction, AppError> {
    // FETCH
    let txn = Transaction::find_by_id(pool, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

    // ENCODE - total by design, unknown categories degrade to the sentinel
    let features = encode(&txn, table);

    // CLASSIFY
    let is_fraud = model.predict(&features)?;

    tracing::debug!(
        "Prediction for transaction {}: is_fraud={}",
        transaction_id,
        is_fraud
    );

    Ok(Prediction {
        transaction_id,
        is_fraud,
    })
}
