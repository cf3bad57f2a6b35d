use crate::{GIT_COMMIT_HASH, store::DocumentStore};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, debug, error, info_span};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    store: String,
    backend: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Document store is reachable", body = [Health]),
        (status = 503, description = "Document store is unreachable", body = [Health])
    ),
    tag= "system"
)]
// axum handler for health
pub async fn health(
    method: Method,
    store: Extension<Arc<dyn DocumentStore>>,
) -> impl IntoResponse {
    let check_span = info_span!("store.check", store.backend = store.backend());
    let result = match store.list_collections().instrument(check_span).await {
        Ok(_) => Ok(()),
        Err(err) => {
            error!("Failed to reach document store: {}", err);

            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if result.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
        backend: store.backend().to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    if result.is_ok() {
        debug!("Document store is healthy");
        (StatusCode::OK, headers, body)
    } else {
        debug!("Document store is unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, test_support::Unreachable};
    use anyhow::Result;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn health_ok_with_memory_store() -> Result<()> {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let response = health(Method::GET, Extension(store)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-App"));

        let body = response.into_body().collect().await?.to_bytes();
        let health: Health = serde_json::from_slice(&body)?;
        assert_eq!(health.store, "ok");
        assert_eq!(health.backend, "memory");
        assert_eq!(health.name, env!("CARGO_PKG_NAME"));
        Ok(())
    }

    #[tokio::test]
    async fn health_unavailable_when_store_fails() -> Result<()> {
        let store: Arc<dyn DocumentStore> = Arc::new(Unreachable);
        let response = health(Method::HEAD, Extension(store)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = response.into_body().collect().await?.to_bytes();
        assert!(body.is_empty());
        Ok(())
    }
}
