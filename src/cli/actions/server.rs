use crate::{
    api::{self, StoreSettings},
    auth::AuthConfig,
    cli::{commands::store::DEFAULT_DATABASE_NAME, telemetry},
    store::{DocumentStore, MemoryStore, PostgresStore},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub database_url: Option<SecretString>,
    pub database_name: Option<String>,
    pub otp_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub enforce_session_expiry: bool,
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new()
            .with_otp_ttl_seconds(self.otp_ttl_seconds)
            .with_session_ttl_seconds(self.session_ttl_seconds)
            .with_enforce_session_expiry(self.enforce_session_expiry)
    }

    fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            database_url_set: self.database_url.is_some(),
            database_name_set: self.database_name.is_some(),
        }
    }
}

/// Execute the server action.
///
/// An unreachable database does not stop the server; `/health` reports it.
/// # Errors
/// Returns an error if the database URL is malformed or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store = build_store(&args)?;
    check_store(store.as_ref()).await;

    let result = api::new(
        args.port,
        store,
        args.store_settings(),
        args.auth_config(),
    )
    .await;

    telemetry::shutdown_tracer();

    result
}

fn build_store(args: &Args) -> Result<Arc<dyn DocumentStore>> {
    let namespace = args
        .database_name
        .as_deref()
        .unwrap_or(DEFAULT_DATABASE_NAME);

    if let Some(url) = &args.database_url {
        let store = PostgresStore::connect(url.expose_secret(), namespace)
            .context("Invalid document store URL")?;
        Ok(Arc::new(store))
    } else {
        warn!("DATABASE_URL not set, documents are kept in memory");
        Ok(Arc::new(MemoryStore::new()))
    }
}

async fn check_store(store: &dyn DocumentStore) {
    match store.list_collections().await {
        Ok(collections) => info!(
            store.backend = store.backend(),
            collections = collections.len(),
            "Document store ready"
        ),
        Err(err) => warn!("Document store unreachable at startup, serving anyway: {err}"),
    }
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        (
            "database_url",
            args.database_url
                .as_ref()
                .map_or_else(|| "none".to_string(), |url| redact_dsn(url.expose_secret())),
        ),
        (
            "database_name",
            args.database_name
                .clone()
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
        ),
        ("otp_ttl_seconds", args.otp_ttl_seconds.to_string()),
        ("session_ttl_seconds", args.session_ttl_seconds.to_string()),
        (
            "enforce_session_expiry",
            args.enforce_session_expiry.to_string(),
        ),
    ];

    let width = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = String::from("Startup configuration:");
    for (key, value) in &entries {
        message.push_str(&format!("\n  {key:<width$}  {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("REDACTED"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}
