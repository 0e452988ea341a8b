//! Prediction handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::inference::pipeline::{predict_transaction, Prediction};
use crate::middleware::auth::UserContext;
use crate::{AppResult, AppState};

/// Predict fraud for a stored transaction by id
pub async fn predict(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<i64>,
) -> AppResult<Json<Prediction>> {
    let prediction =
        predict_transaction(&state.pool, &state.encoder, state.model.as_ref(), id).await?;

    Ok(Json(prediction))
}
