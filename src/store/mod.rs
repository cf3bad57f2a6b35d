//! Schemaless document persistence.
//!
//! Callers address named collections and query them with equality filters.
//! Nothing here enforces a schema beyond "a document is a JSON object"; the
//! OTP, session, and vertical modules own the shape of what they store.
//!
//! The store handle is built once at startup and passed around as
//! `Arc<dyn DocumentStore>`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use ulid::Ulid;

/// A stored document: always a JSON object.
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Equality filter over top-level document fields.
///
/// An empty filter matches every document in the collection.
#[derive(Debug, Clone, Default)]
pub struct Filter(Document);

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// True when every filter field is present in `doc` with an equal value.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    #[must_use]
    pub fn as_document(&self) -> &Document {
        &self.0
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `doc` in `collection` and return its generated id.
    ///
    /// The stored document carries `id`, `created_at` and `updated_at`.
    async fn insert(&self, collection: &str, doc: Document) -> Result<String, StoreError>;

    /// Return at most `limit` matching documents in insertion order.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;

    /// Shallow-merge `patch` into every matching document, returning the match count.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<u64, StoreError>;

    /// Names of the collections holding at least one document, sorted.
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    fn backend(&self) -> &'static str;

    /// False when documents are lost on restart.
    fn is_persistent(&self) -> bool;
}

/// Serialize a typed record into a document.
///
/// # Errors
/// Returns an error when the value does not serialize to a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Deserialize a stored document into a typed record, ignoring unknown fields.
///
/// # Errors
/// Returns an error when required fields are missing or mistyped.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Current UTC time in the RFC 3339 form used for store bookkeeping fields.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Stamp the bookkeeping fields every inserted document receives.
pub(crate) fn stamp_new(doc: &mut Document) -> String {
    let id = Ulid::new().to_string();
    let now = timestamp_now();
    doc.insert("id".to_string(), Value::String(id.clone()));
    doc.insert("created_at".to_string(), Value::String(now.clone()));
    doc.insert("updated_at".to_string(), Value::String(now));
    id
}


#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn filter_matches_all_fields() -> Result<()> {
        let doc = to_document(&json!({"phone": "+1555", "code": "123456", "status": "pending"}))?;
        assert!(Filter::new().matches(&doc));
        assert!(Filter::new().with("phone", "+1555").matches(&doc));
        assert!(
            Filter::new()
                .with("phone", "+1555")
                .with("code", "123456")
                .matches(&doc)
        );
        assert!(!Filter::new().with("phone", "+1555").with("code", "000000").matches(&doc));
        assert!(!Filter::new().with("missing", "x").matches(&doc));
        Ok(())
    }

    #[test]
    fn to_document_rejects_non_objects() {
        assert!(matches!(
            to_document(&json!([1, 2, 3])),
            Err(StoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn from_document_ignores_bookkeeping_fields() -> Result<()> {
        let mut doc = to_document(&Sample {
            name: "a".to_string(),
            count: 2,
        })?;
        let id = stamp_new(&mut doc);
        assert_eq!(doc.get("id"), Some(&Value::String(id)));
        assert!(doc.contains_key("created_at"));
        let sample: Sample = from_document(doc)?;
        assert_eq!(sample.count, 2);
        Ok(())
    }
}
