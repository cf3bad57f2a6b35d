//! Random code and token generation backed by the OS CSPRNG.

use rand::{Rng, RngCore, rngs::OsRng};

const CODE_SPACE: u32 = 1_000_000;
const SESSION_TOKEN_BYTES: usize = 16;

/// Draw a 6-digit, zero-padded one-time code uniformly from `[0, 1_000_000)`.
#[must_use]
pub fn generate_code() -> String {
    let code = OsRng.gen_range(0..CODE_SPACE);
    format!("{code:06}")
}

/// Hex-encode `len` random bytes.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn random_hex(len: usize) -> Result<String, rand::Error> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Create a new opaque session token (32 hex characters).
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_session_token() -> Result<String, rand::Error> {
    random_hex(SESSION_TOKEN_BYTES)
}
