//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, auth, store};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8000);

    let store_opts = store::Options::parse(matches);
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        database_url: store_opts.url,
        database_name: store_opts.name,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        enforce_session_expiry: auth_opts.enforce_session_expiry,
    }))
}
