use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by the OTP and session flows.
///
/// The display strings are the messages returned to clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    Validation(&'static str),
    #[error("Invalid code")]
    InvalidCode,
    #[error("Code expired")]
    CodeExpired,
    #[error("Missing token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Session expired")]
    SessionExpired,
    #[error("failed to generate random value: {0}")]
    Random(#[from] rand::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}
