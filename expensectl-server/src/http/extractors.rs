//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use expensectl_core::models::{User, ValidationError};

use super::error::ApiError;
use super::server::AppState;
use crate::auth::hash_token;
use crate::db::repos::{DbError, SessionRepo, UserRepo};

/// The signed-in user behind an `Authorization: Bearer <token>` header
pub struct AuthUser {
    pub user: User,
    /// SHA-256 of the presented token, for logout
    pub token_hash: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        let token_hash = hash_token(token);

        let session = SessionRepo::new(&state.pool)
            .find_active(&token_hash)
            .await?
            .ok_or_else(|| {
                tracing::debug!("Rejected unknown or expired session");
                ApiError::Unauthorized
            })?;

        let user = match UserRepo::new(&state.pool).get(session.user_id).await {
            Ok(user) => user,
            Err(DbError::NotFound { .. }) => return Err(ApiError::Unauthorized),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { user, token_hash })
    }
}

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}
