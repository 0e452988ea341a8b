//! End-to-end API tests: the real router over an in-memory database, with a
//! stub classifier standing in for the ONNX session.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

use fraudguard::config::Config;
use fraudguard::inference::{
    EncodingTable, FeatureVector, FraudClassifier, FraudModel, ModelError,
};
use fraudguard::models::flags::FlagSchema;
use fraudguard::{create_router, db, AppState};

const TABLE_JSON: &str = r#"{
    "use_chip": {"Swipe Transaction": 0, "Chip Transaction": 1},
    "merchant_city": {"Orlando": 0, "Miami": 1},
    "merchant_state": {"FL": 0}
}"#;

/// Deterministic stand-in for the ONNX classifier
struct StubModel {
    verdict: u8,
}

impl FraudModel for StubModel {
    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        features
            .validate()
            .map_err(|e| ModelError::IncompatibleFeatures(e.to_string()))?;
        Ok(self.verdict)
    }

    fn is_loaded(&self) -> bool {
        true
    }
}

fn test_config(flag_schema: FlagSchema) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 1,
        model_path: "nonexistent/fraud_model.onnx".to_string(),
        encoding_map_path: "nonexistent/encoding_map.json".to_string(),
        flag_schema,
        environment: "test".to_string(),
    }
}

async fn test_state(flag_schema: FlagSchema, model: Arc<dyn FraudModel>) -> AppState {
    // A shared in-memory database needs a single connection
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();

    AppState {
        pool,
        config: test_config(flag_schema),
        encoder: Arc::new(EncodingTable::from_json(TABLE_JSON).unwrap()),
        model,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Register a user and log in, returning a bearer token
async fn authenticate(app: &Router) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "correct horse battery staple"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({
            "identifier": "alice",
            "password": "correct horse battery staple"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    body["access_token"].as_str().unwrap().to_string()
}

fn sample_transaction() -> Value {
    json!({
        "client_id": 123,
        "card_id": 4567,
        "amount": 100.50,
        "use_chip": "Swipe Transaction",
        "merchant_id": 7890,
        "merchant_city": "Orlando",
        "merchant_state": "FL",
        "zip": 32804,
        "mcc": 7538,
        "hour": 14,
        "dayofweek": 2,
        "is_weekend": 0,
        "bad_cvv": 0,
        "bad_card_number": 0,
        "bad_pin": 0,
        "bad_zipcode": 0,
        "insufficient_balance": 0,
        "technical_glitch": 0
    })
}

async fn row_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let state = test_state(FlagSchema::Named, Arc::new(StubModel { verdict: 0 })).await;
    let app = create_router(state);

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn submit_then_predict_round_trip() {
    let state = test_state(FlagSchema::Named, Arc::new(StubModel { verdict: 0 })).await;
    let app = create_router(state);
    let token = authenticate(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/transactions",
        Some(&token),
        Some(sample_transaction()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().expect("assigned id");
    assert!(id > 0);
    assert_eq!(body["client_id"], 123);
    assert_eq!(body["use_chip"], "Swipe Transaction");
    assert_eq!(body["bad_cvv"], 0);

    // The persisted record reads back verbatim
    let (status, fetched) = send(
        &app,
        "GET",
        &format!("/api/v1/transactions/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["amount"], 100.50);

    let (status, prediction) = send(
        &app,
        "GET",
        &format!("/api/v1/predict/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prediction["transaction_id"], id);
    let verdict = prediction["is_fraud"].as_i64().unwrap();
    assert!(verdict == 0 || verdict == 1);
}

#[tokio::test]
async fn predict_unknown_id_is_not_found() {
    let state = test_state(FlagSchema::Named, Arc::new(StubModel { verdict: 0 })).await;
    let app = create_router(state);
    let token = authenticate(&app).await;

    let (status, body) = send(&app, "GET", "/api/v1/predict/424242", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Transaction not found");
}

#[tokio::test]
async fn invalid_dayofweek_is_rejected_without_side_effect() {
    let state = test_state(FlagSchema::Named, Arc::new(StubModel { verdict: 0 })).await;
    let pool = state.pool.clone();
    let app = create_router(state);
    let token = authenticate(&app).await;

    let mut body = sample_transaction();
    body["dayofweek"] = json!(9);

    let before = row_count(&pool).await;
    let (status, response) = send(&app, "POST", "/api/v1/transactions", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Validation failed");
    assert_eq!(response["rejected_fields"], json!(["dayofweek"]));
    assert_eq!(row_count(&pool).await, before);
}

#[tokio::test]
async fn domain_routes_require_a_credential() {
    let state = test_state(FlagSchema::Named, Arc::new(StubModel { verdict: 0 })).await;
    let app = create_router(state);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/transactions",
        None,
        Some(sample_transaction()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/v1/predict/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/predict/1",
        Some("not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_model_answers_service_unavailable() {
    // A classifier whose artifact failed to load stays permanently
    // unavailable; requests fail fast with 503.
    let classifier = FraudClassifier::load("nonexistent/fraud_model.onnx");
    assert!(!classifier.is_loaded());

    let state = test_state(FlagSchema::Named, Arc::new(classifier)).await;
    let app = create_router(state);
    let token = authenticate(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/transactions",
        Some(&token),
        Some(sample_transaction()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/predict/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Fraud model unavailable");
}

#[tokio::test]
async fn generic_flag_schema_accepts_slot_names() {
    let state = test_state(FlagSchema::Generic, Arc::new(StubModel { verdict: 1 })).await;
    let app = create_router(state);
    let token = authenticate(&app).await;

    let body = json!({
        "client_id": 123,
        "card_id": 4567,
        "amount": 100.50,
        "use_chip": "Chip Transaction",
        "merchant_id": 7890,
        "merchant_city": "Miami",
        "merchant_state": "FL",
        "zip": 33101,
        "mcc": 5411,
        "hour": 9,
        "dayofweek": 5,
        "is_weekend": 1,
        "error_0": 0,
        "error_1": 0,
        "error_2": 1,
        "error_3": 0,
        "error_4": 0,
        "error_5": 0
    });

    let (status, stored) = send(&app, "POST", "/api/v1/transactions", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(stored["error_2"], 1);
    assert!(stored.get("bad_pin").is_none());

    // Named-variant fields are rejected under the generic schema
    let (status, response) = send(
        &app,
        "POST",
        "/api/v1/transactions",
        Some(&token),
        Some(sample_transaction()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Validation failed");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let state = test_state(FlagSchema::Named, Arc::new(StubModel { verdict: 0 })).await;
    let app = create_router(state);
    let _token = authenticate(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "alice2@example.com",
            "password": "password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn password_reset_flow() {
    let state = test_state(FlagSchema::Named, Arc::new(StubModel { verdict: 0 })).await;
    let app = create_router(state);
    let _token = authenticate(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/forgot-password",
        None,
        Some(json!({"email": "alice@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/forgot-password",
        None,
        Some(json!({"email": "nobody@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/reset-password",
        None,
        Some(json!({"email": "alice@example.com", "new_password": "even better password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"identifier": "alice", "password": "correct horse battery staple"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"identifier": "alice@example.com", "password": "even better password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
