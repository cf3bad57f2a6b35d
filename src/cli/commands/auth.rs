use clap::{Arg, ArgMatches, Command, builder::BoolishValueParser};

pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_ENFORCE_SESSION_EXPIRY: &str = "enforce-session-expiry";

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub otp_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub enforce_session_expiry: bool,
}

impl Options {
    /// Parse OTP and session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_i64 = |id: &str| {
            matches
                .get_one::<i64>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            otp_ttl_seconds: get_i64(ARG_OTP_TTL_SECONDS)?,
            session_ttl_seconds: get_i64(ARG_SESSION_TTL_SECONDS)?,
            enforce_session_expiry: matches
                .get_one::<bool>(ARG_ENFORCE_SESSION_EXPIRY)
                .copied()
                .unwrap_or(true),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_OTP_TTL_SECONDS)
                .long(ARG_OTP_TTL_SECONDS)
                .help("One-time code TTL in seconds")
                .env("SUPERAPP_OTP_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("SUPERAPP_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_ENFORCE_SESSION_EXPIRY)
                .long(ARG_ENFORCE_SESSION_EXPIRY)
                .help("Reject session tokens past their expiry (true/false)")
                .long_help(
                    "Reject session tokens past their expiry.\n\nSet to false to let tokens authenticate indefinitely, as older clients of the demo expect.",
                )
                .env("SUPERAPP_ENFORCE_SESSION_EXPIRY")
                .default_value("true")
                .value_parser(BoolishValueParser::new()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn clear_env<F: FnOnce() -> Result<()>>(f: F) -> Result<()> {
        temp_env::with_vars(
            [
                ("SUPERAPP_OTP_TTL_SECONDS", None::<&str>),
                ("SUPERAPP_SESSION_TTL_SECONDS", None::<&str>),
                ("SUPERAPP_ENFORCE_SESSION_EXPIRY", None::<&str>),
            ],
            f,
        )
    }

    #[test]
    fn test_defaults() -> Result<()> {
        clear_env(|| {
            let matches = with_args(Command::new("test")).try_get_matches_from(vec!["test"])?;
            let options = Options::parse(&matches)?;
            assert_eq!(options.otp_ttl_seconds, 300);
            assert_eq!(options.session_ttl_seconds, 604_800);
            assert!(options.enforce_session_expiry);
            Ok(())
        })
    }

    #[test]
    fn test_overrides() -> Result<()> {
        clear_env(|| {
            let matches = with_args(Command::new("test")).try_get_matches_from(vec![
                "test",
                "--otp-ttl-seconds",
                "60",
                "--enforce-session-expiry",
                "no",
            ])?;
            let options = Options::parse(&matches)?;
            assert_eq!(options.otp_ttl_seconds, 60);
            assert!(!options.enforce_session_expiry);
            Ok(())
        })
    }

    #[test]
    fn test_zero_ttl_rejected() -> Result<()> {
        clear_env(|| {
            let result = with_args(Command::new("test")).try_get_matches_from(vec![
                "test",
                "--otp-ttl-seconds",
                "0",
            ]);
            assert!(result.is_err());
            Ok(())
        })
    }
}
