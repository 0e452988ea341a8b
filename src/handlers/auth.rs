//! Authentication handlers

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::http::StatusCode;
use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    User, UserInfo,
};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // User ID
    pub username: String, // Username
    pub exp: usize,       // Expiration timestamp
    pub iat: usize,       // Issued at
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    if User::find_by_username(&state.pool, &req.username)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(
            "Username already registered".to_string(),
        ));
    }
    if User::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::AlreadyExists(
            "Email already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::create(&state.pool, &req.username, &req.email, &password_hash).await?;

    tracing::info!("New user registered: {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(user.to_info())))
}

/// Login endpoint. The identifier can be a username or an email address.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = User::find_by_identifier(&state.pool, &req.identifier)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    verify_password(&req.password, &user.password_hash)?;

    User::update_last_login(&state.pool, user.id).await?;

    let token = generate_jwt(&user, &state.config.jwt_secret, state.config.jwt_expiration_hours)?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: user.to_info(),
    }))
}

/// Check whether a user exists before a password reset
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    User::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found. Please register.".to_string()))?;

    Ok(Json(json!({
        "message": "User found. You can reset your password."
    })))
}

/// Reset the user's password if the email exists
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let password_hash = hash_password(&req.new_password)?;

    let user = User::update_password(&state.pool, &req.email, &password_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found. Please register.".to_string()))?;

    tracing::info!("Password reset for user {}", user.id);

    Ok(Json(json!({
        "message": "Password updated successfully. Please login with your new password."
    })))
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(e.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::InternalError("Invalid password hash".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

/// Generate JWT token
fn generate_jwt(user: &User, secret: &str, expiration_hours: u64) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours as i64);

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(e.to_string()))
}
