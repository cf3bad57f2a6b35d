pub mod models;
pub mod service;

pub use models::{OTP_COLLECTION, OtpRecord, OtpStatus};
pub use service::{OtpIssued, OtpService};
