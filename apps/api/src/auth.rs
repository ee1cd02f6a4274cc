//! Caller identity from the bearer token.
//!
//! The token's signature is checked by the identity layer in front of the
//! service; here the payload is only decoded to learn who is calling.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub object_id: String,
    pub upn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    oid: Option<String>,
    upn: Option<String>,
    preferred_username: Option<String>,
}

impl UserClaims {
    /// Reads the claims from a compact JWT (`header.payload.signature`).
    pub fn from_token(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let claims: TokenPayload = serde_json::from_slice(&bytes).ok()?;
        let object_id = claims.oid.filter(|oid| !oid.is_empty())?;
        Some(Self {
            object_id,
            upn: claims.upn.or(claims.preferred_username),
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        UserClaims::from_token(token.trim()).ok_or_else(|| {
            debug!("Rejected bearer token without a readable oid claim");
            AppError::Unauthorized
        })
    }
}
