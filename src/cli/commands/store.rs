use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_DATABASE_URL: &str = "database-url";
pub const ARG_DATABASE_NAME: &str = "database-name";

pub const DEFAULT_DATABASE_NAME: &str = "superapp";

#[derive(Debug)]
pub struct Options {
    pub url: Option<SecretString>,
    pub name: Option<String>,
}

impl Options {
    /// Parse document store arguments from matches.
    ///
    /// Empty values (e.g. `DATABASE_URL=""`) count as unset.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            url: get_non_empty(ARG_DATABASE_URL).map(SecretString::from),
            name: get_non_empty(ARG_DATABASE_NAME),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DATABASE_URL)
                .long(ARG_DATABASE_URL)
                .help("Postgres connection string for the document store")
                .long_help(
                    "Postgres connection string for the document store.\n\nWhen unset, documents are kept in memory and lost on restart.",
                )
                .env("DATABASE_URL")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_DATABASE_NAME)
                .long(ARG_DATABASE_NAME)
                .help("Namespace that scopes every collection in the store (default: superapp)")
                .env("DATABASE_NAME"),
        )
}
