//! API handlers and the error type they share.
//!
//! Every failure is rendered as `{"detail": "..."}` so existing demo clients
//! keep parsing error bodies the same way.

pub mod auth;
pub mod diagnostics;
pub mod health;
pub mod root;
pub mod verticals;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::{auth::AuthError, store::StoreError};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to generate random value: {0}")]
    Random(#[from] rand::Error),
    #[error(transparent)]
    Payload(#[from] JsonRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(
                AuthError::Validation(_) | AuthError::InvalidCode | AuthError::CodeExpired,
            ) => StatusCode::BAD_REQUEST,
            Self::Auth(
                AuthError::MissingToken | AuthError::InvalidToken | AuthError::SessionExpired,
            ) => StatusCode::UNAUTHORIZED,
            Self::Payload(rejection) => rejection.status(),
            Self::Auth(AuthError::Random(_) | AuthError::Store(_))
            | Self::Store(_)
            | Self::Random(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Payload(rejection) => rejection.body_text(),
            _ if status.is_server_error() => {
                error!("Request failed: {self}");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
