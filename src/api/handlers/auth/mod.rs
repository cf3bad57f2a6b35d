//! One-time code endpoints and session resolution for the verticals.

pub mod otp;
pub(crate) mod principal;
pub mod types;
