//! Account endpoints: register, login, logout, me
//!
//! PBKDF2 runs on the blocking pool so a login never stalls the runtime.
//! Unknown emails are checked against a decoy hash, so a failed login costs
//! the same whether or not the account exists.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use expensectl_core::models::{Email, Password, User, UserName};

use crate::auth::{decoy_hash, hash_password, hash_token, new_token, verify_password};
use crate::db::repos::{SessionRepo, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;

/// Register request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued session; the token is shown exactly once
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// POST /auth/register - create an account
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let email = Email::new(&req.email)?;
    let name = UserName::new(&req.name)?;
    let password = Password::new(&req.password)?;

    let iterations = state.password_iterations;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| ApiError::internal(format!("password hashing task failed: {e}")))?;

    let user = UserRepo::new(&state.pool).create(&email, &name, &hash).await?;
    tracing::info!(user_id = %user.id, "Registered user");

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login - exchange credentials for a bearer token
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = Email::new(&req.email)?;
    let credentials = UserRepo::new(&state.pool).credentials(&email).await?;

    let stored = match &credentials {
        Some(c) => c.password_hash.clone(),
        None => decoy_hash(state.password_iterations),
    };
    let password = req.password;
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::internal(format!("password check task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("stored hash for user: {e}")))?;

    let credentials = match credentials {
        Some(c) if verified => c,
        Some(c) => {
            tracing::warn!(user_id = %c.user.id, "Rejected login with wrong password");
            return Err(ApiError::InvalidCredentials);
        }
        None => {
            tracing::debug!("Login for unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = new_token();
    let session = SessionRepo::new(&state.pool)
        .create(credentials.user.id, &hash_token(&token), state.session_ttl)
        .await?;

    Ok(Json(LoginResponse {
        token,
        expires_at: session.expires_at,
        user: credentials.user,
    }))
}

/// POST /auth/logout - end the presented session
async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<StatusCode, ApiError> {
    SessionRepo::new(&state.pool).delete(&auth.token_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - the signed-in user
async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
