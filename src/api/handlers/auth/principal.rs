//! Session token extraction for the vertical endpoints.
//!
//! Demo clients pass the token as a `?token=` query parameter; an
//! `Authorization: Bearer` header is accepted when the parameter is absent.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::{AuthError, AuthState},
    session::Principal,
};

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    /// Session token returned by `/auth/verify-otp`.
    pub token: Option<String>,
}

/// Resolve the caller's session, or fail with `MissingToken`/`InvalidToken`.
pub(crate) async fn require_session(
    query: &TokenQuery,
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<Principal, AuthError> {
    let token = query
        .token
        .as_deref()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .or_else(|| extract_bearer_token(headers));
    auth_state.sessions().authenticate(token.as_deref()).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
