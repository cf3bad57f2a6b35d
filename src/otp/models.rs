use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const OTP_COLLECTION: &str = "otp";

/// Lifecycle of a one-time code.
///
/// Nothing transitions a record into `Expired`; lapsed codes are detected by
/// comparing `expires_at` at verification time. The variant exists so records
/// edited out-of-band are still honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpStatus {
    Pending,
    Verified,
    Expired,
}

impl OtpStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub phone: String,
    pub code: String,
    pub status: OtpStatus,
    pub expires_at: DateTime<Utc>,
    /// Written as 0 and never incremented.
    #[serde(default)]
    pub attempts: u32,
}

impl OtpRecord {
    #[must_use]
    pub fn pending(phone: &str, code: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            phone: phone.to_string(),
            code,
            status: OtpStatus::Pending,
            expires_at,
            attempts: 0,
        }
    }

    /// A record can be redeemed while it is not marked expired and its
    /// deadline has not passed.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status != OtpStatus::Expired && self.expires_at >= now
    }
}
