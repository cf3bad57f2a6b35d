//! # Superapp (demo "super app" backend)
//!
//! `superapp` exposes phone-based one-time-code authentication, bearer
//! sessions, and a handful of mock verticals (cab quotes, grocery checkout,
//! travel search, payment intents) on top of a schemaless document store.
//!
//! ## OTP and Session Lifecycle
//!
//! - **Request:** a 6-digit code is generated from the OS CSPRNG and stored as a
//!   `pending` record that lapses after 5 minutes. The code is returned in the
//!   response; there is no SMS gateway.
//! - **Verify:** the `(phone, code)` pair is looked up, its deadline checked, and a
//!   session token (16 random bytes, hex) valid for 7 days is issued. Marking the
//!   code `verified` afterwards is best-effort and never fails the request.
//! - **Authenticate:** vertical endpoints resolve the `?token=` query parameter (or
//!   an `Authorization: Bearer` header) to the phone number it was issued to.
//!
//! Codes are not single-use and there is no attempt limiting; both are known gaps
//! of the demo and are documented on the relevant types.
//!
//! ## Storage
//!
//! With `DATABASE_URL` set, documents are kept in Postgres (one JSONB table);
//! otherwise an in-process store is used and `/test` reports the database as not
//! configured.

pub mod api;
pub mod auth;
pub mod cli;
pub mod otp;
pub mod session;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
