use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SESSION_COLLECTION: &str = "session";

/// A bearer session minted after a successful OTP verification.
///
/// `user_id` is the verified phone number; there is no separate user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Identity resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}
