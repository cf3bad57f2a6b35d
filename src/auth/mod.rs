//! Shared pieces of the OTP and session flows: configuration, the error
//! taxonomy surfaced to clients, and random code/token generation.

mod config;
mod error;
mod utils;

pub use config::AuthConfig;
pub use error::AuthError;
pub use utils::{generate_code, generate_session_token, random_hex};

use std::sync::Arc;

use crate::{
    otp::OtpService,
    session::SessionService,
    store::DocumentStore,
};

/// Auth services shared by every handler.
pub struct AuthState {
    otp: OtpService,
    sessions: SessionService,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, store: Arc<dyn DocumentStore>) -> Self {
        let sessions = SessionService::new(store.clone(), config.clone());
        let otp = OtpService::new(store, config, sessions.clone());
        Self { otp, sessions }
    }

    #[must_use]
    pub fn otp(&self) -> &OtpService {
        &self.otp
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }
}
