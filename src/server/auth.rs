//! Bearer-token authentication for the `/api` routes.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::core::diary::Principal;

use super::error::ApiError;
use super::state::AppState;

/// Extractor resolving `Authorization: Bearer <token>` to the session's user.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub principal: Principal,
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?
            .to_string();

        let principal = state
            .sessions
            .resolve(&token)
            .await
            .ok_or_else(|| ApiError::unauthorized("session expired or unknown"))?;

        Ok(Self { principal, token })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
