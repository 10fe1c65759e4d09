use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::axum_http::error_responses::LocalizedError;

pub const ROLE_STAFF: &str = "staff";
pub const ROLE_CUSTOMER: &str = "customer";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: Option<String>,
    pub staff: bool,
}

/// Extracts an authenticated staff member; customers get 403.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffUser(pub AuthUser);

/// HS256 verification key, installed on the router as an `Extension`.
#[derive(Clone)]
pub struct JwtKeys {
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("staff access required")]
    Forbidden,
    #[error("jwt keys are not installed on the router")]
    NotConfigured,
}

impl LocalizedError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "unauthorized",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::Forbidden => "forbidden",
            AuthError::NotConfigured => "internal_error",
        }
    }
}

pub fn validate_jwt(token: &str, keys: &JwtKeys) -> Result<AuthUser, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    let claims = decode::<Claims>(token, &keys.decoding, &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?
        .claims;

    let user_id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))?;

    let staff = match claims.role.as_str() {
        ROLE_STAFF => true,
        ROLE_CUSTOMER => false,
        other => return Err(AuthError::InvalidToken(format!("unknown role {other}"))),
    };

    Ok(AuthUser {
        user_id,
        email: claims.email,
        staff,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let keys = parts
            .extensions
            .get::<Arc<JwtKeys>>()
            .cloned()
            .ok_or(AuthError::NotConfigured)?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        validate_jwt(token, &keys).inspect_err(|err| {
            debug!(error = %err, "auth: rejected token");
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.staff {
            warn!(user_id = user.user_id, path = %parts.uri.path(), "auth: staff route denied");
            return Err(AuthError::Forbidden);
        }
        Ok(StaffUser(user))
    }
}

#[cfg(test)]
mod tests;
