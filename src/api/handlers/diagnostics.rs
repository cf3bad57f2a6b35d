//! `GET /test`: a human-readable report on the document store.
//!
//! The report never fails: a missing or broken store only changes the text.
//! Without a persistent store only the fixed "not initialized" report is
//! returned.

use axum::{extract::Extension, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::store::DocumentStore;

const MAX_COLLECTIONS: usize = 10;
const MAX_ERROR_CHARS: usize = 50;
const ERROR_PREFIX: &str = "⚠️ Connected but Error: ";

/// Which store settings were supplied at startup.
///
/// Only presence is reported; values such as the database URL carry
/// credentials and stay out of responses.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreSettings {
    pub database_url_set: bool,
    pub database_name_set: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Diagnostics {
    pub backend: String,
    pub database: String,
    pub store: String,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}

fn set_or_not(flag: bool) -> String {
    if flag { "✅ Set" } else { "❌ Not Set" }.to_string()
}

fn truncate(message: &str) -> String {
    message.chars().take(MAX_ERROR_CHARS).collect()
}

#[utoipa::path(
    get,
    path = "/test",
    responses(
        (status = 200, description = "Store diagnostics", body = Diagnostics)
    ),
    tag = "system"
)]
#[instrument(skip_all)]
pub async fn diagnostics(
    store: Extension<Arc<dyn DocumentStore>>,
    settings: Extension<StoreSettings>,
) -> Json<Diagnostics> {
    let mut report = Diagnostics {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        store: store.backend().to_string(),
        database_url: None,
        database_name: None,
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    if !store.is_persistent() {
        report.database = "⚠️ Available but not initialized".to_string();
        return Json(report);
    }

    report.database = "✅ Available".to_string();
    report.database_url = Some(set_or_not(settings.database_url_set));
    report.database_name = Some(set_or_not(settings.database_name_set));
    report.connection_status = "Connected".to_string();

    match store.list_collections().await {
        Ok(mut collections) => {
            collections.truncate(MAX_COLLECTIONS);
            report.collections = collections;
            report.database = "✅ Connected & Working".to_string();
        }
        Err(err) => {
            warn!("Store diagnostics failed: {err}");
            report.database = format!("{ERROR_PREFIX}{}", truncate(&err.to_string()));
        }
    }

    Json(report)
}
