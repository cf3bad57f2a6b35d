//! Postgres-backed document store.
//!
//! Documents live in a single JSONB table partitioned by `namespace` (the
//! configured database name) and `collection`. Equality filters are
//! expressed as JSONB containment and patches as a top-level `||` merge.
//!
//! The pool connects lazily and the table is created on first use, so an
//! unreachable database surfaces as per-request errors instead of a failed
//! startup.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::sync::OnceCell;
use tracing::{Instrument, info_span};

use super::{Document, DocumentStore, Filter, StoreError, stamp_new, timestamp_now};

const SCHEMA_SQL: [&str; 2] = [
    r"
    CREATE TABLE IF NOT EXISTS documents (
        seq BIGSERIAL PRIMARY KEY,
        namespace TEXT NOT NULL,
        collection TEXT NOT NULL,
        body JSONB NOT NULL
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS documents_namespace_collection_idx
        ON documents (namespace, collection, seq)
    ",
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    namespace: String,
    schema: Arc<OnceCell<()>>,
}

impl PostgresStore {
    /// Build a lazily connecting pool for `dsn`.
    ///
    /// No connection is opened here; the first operation connects and
    /// creates the documents table.
    ///
    /// # Errors
    /// Returns an error if `dsn` is not a valid connection string.
    pub fn connect(dsn: &str, namespace: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .acquire_timeout(Duration::from_secs(5))
            .test_before_acquire(true)
            .connect_lazy(dsn)?;

        Ok(Self::from_pool(pool, namespace))
    }

    #[must_use]
    pub fn from_pool(pool: PgPool, namespace: &str) -> Self {
        Self {
            pool,
            namespace: namespace.to_string(),
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Create the documents table once; retried on the next call if it fails.
    async fn ready(&self) -> Result<(), StoreError> {
        self.schema
            .get_or_try_init(|| self.ensure_schema())
            .await
            .map(|_| ())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA_SQL {
            sqlx::query(statement)
                .execute(&self.pool)
                .instrument(query_span("CREATE", statement))
                .await?;
        }
        Ok(())
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn insert(&self, collection: &str, mut doc: Document) -> Result<String, StoreError> {
        self.ready().await?;
        let id = stamp_new(&mut doc);
        let query = "INSERT INTO documents (namespace, collection, body) VALUES ($1, $2, $3)";
        sqlx::query(query)
            .bind(&self.namespace)
            .bind(collection)
            .bind(Value::Object(doc))
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;
        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        self.ready().await?;
        let query = r"
            SELECT body FROM documents
            WHERE namespace = $1 AND collection = $2 AND body @> $3
            ORDER BY seq
            LIMIT $4
        ";
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(query)
            .bind(&self.namespace)
            .bind(collection)
            .bind(Value::Object(filter.as_document().clone()))
            .bind(limit)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;

        rows.into_iter()
            .map(|row| match row.try_get::<Value, _>("body")? {
                Value::Object(doc) => Ok(doc),
                other => Err(StoreError::InvalidDocument(format!(
                    "stored body is not an object: {other}"
                ))),
            })
            .collect()
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<u64, StoreError> {
        self.ready().await?;
        let mut patch = patch;
        if !patch.contains_key("updated_at") {
            patch.insert("updated_at".to_string(), Value::String(timestamp_now()));
        }
        let query = r"
            UPDATE documents SET body = body || $4
            WHERE namespace = $1 AND collection = $2 AND body @> $3
        ";
        let result = sqlx::query(query)
            .bind(&self.namespace)
            .bind(collection)
            .bind(Value::Object(filter.as_document().clone()))
            .bind(Value::Object(patch))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.ready().await?;
        let query =
            "SELECT DISTINCT collection FROM documents WHERE namespace = $1 ORDER BY collection";
        let rows = sqlx::query(query)
            .bind(&self.namespace)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        rows.into_iter()
            .map(|row| row.try_get::<String, _>("collection").map_err(StoreError::from))
            .collect()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn is_persistent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn from_pool_keeps_namespace() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let store = PostgresStore::from_pool(pool, "superapp");
        assert_eq!(store.namespace, "superapp");
        assert_eq!(store.backend(), "postgres");
        assert!(store.is_persistent());
        Ok(())
    }

    #[tokio::test]
    async fn connect_succeeds_without_a_server() -> Result<()> {
        let store = PostgresStore::connect("postgres://u:p@127.0.0.1:1/x", "x")?;
        assert_eq!(store.namespace, "x");
        assert!(store.schema.get().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn connect_rejects_invalid_dsn() {
        assert!(PostgresStore::connect("not a dsn", "x").is_err());
    }

    #[tokio::test]
    async fn unreachable_database_fails_each_operation() -> Result<()> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://u:p@127.0.0.1:1/x")?;
        let store = PostgresStore::from_pool(pool, "x");

        assert!(store.list_collections().await.is_err());
        assert!(store.list_collections().await.is_err());
        assert!(store.insert("otp", Document::new()).await.is_err());
        assert!(store.schema.get().is_none());
        Ok(())
    }
}
