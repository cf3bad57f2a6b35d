use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    api::handlers::{
        ApiError, ErrorResponse,
        auth::principal::{TokenQuery, require_session},
    },
    auth::AuthState,
    store::{DocumentStore, Filter, StoreError, from_document, to_document},
};

pub const ACTIVITY_COLLECTION: &str = "activity";
const ACTIVITY_LIMIT: usize = 50;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Travel,
    Payment,
    Cab,
    Grocery,
}

/// One entry of a user's activity timeline.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub user_id: String,
    pub category: ActivityCategory,
    pub title: String,
    pub details: Option<String>,
    pub amount: Option<f64>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub id: String,
    #[serde(flatten)]
    pub record: ActivityRecord,
    pub created_at: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ActivityList {
    pub items: Vec<ActivityItem>,
}

fn demo_entries(user_id: &str) -> [ActivityRecord; 4] {
    let entry = |category, title: &str, details: &str, amount| ActivityRecord {
        user_id: user_id.to_string(),
        category,
        title: title.to_string(),
        details: Some(details.to_string()),
        amount: Some(amount),
    };
    [
        entry(
            ActivityCategory::Travel,
            "Flight to NYC booked",
            "6E 101",
            249.0,
        ),
        entry(
            ActivityCategory::Payment,
            "Paid at Coffee Bar",
            "VISA **** 4213",
            4.5,
        ),
        entry(
            ActivityCategory::Cab,
            "Cab ride completed",
            "Downtown to Office",
            12.3,
        ),
        entry(
            ActivityCategory::Grocery,
            "Grocery order delivered",
            "Order #GZ1021",
            56.9,
        ),
    ]
}

async fn load(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<ActivityItem>, StoreError> {
    store
        .find(
            ACTIVITY_COLLECTION,
            &Filter::new().with("user_id", user_id),
            ACTIVITY_LIMIT,
        )
        .await?
        .into_iter()
        .map(from_document::<ActivityItem>)
        .collect()
}

/// List the user's activity, seeding the demo entries on the first visit.
///
/// Two concurrent first visits can both seed; nothing serializes them.
pub(crate) async fn load_or_seed(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<ActivityItem>, StoreError> {
    let items = load(store, user_id).await?;
    if !items.is_empty() {
        return Ok(items);
    }

    debug!("Seeding demo activity");
    for entry in demo_entries(user_id) {
        store
            .insert(ACTIVITY_COLLECTION, to_document(&entry)?)
            .await?;
    }
    load(store, user_id).await
}

#[utoipa::path(
    get,
    path = "/activity",
    params(TokenQuery),
    responses(
        (status = 200, description = "Activity timeline for the session's user", body = ActivityList),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "verticals"
)]
#[instrument(skip_all)]
pub async fn list_activity(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn DocumentStore>>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> Result<Json<ActivityList>, ApiError> {
    let principal = require_session(&query, &headers, &auth_state).await?;
    let items = load_or_seed(store.0.as_ref(), &principal.user_id).await?;
    Ok(Json(ActivityList { items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::verticals::test_support::Fixture;
    use anyhow::Result;
    use axum::{http::StatusCode, response::IntoResponse};

    #[tokio::test]
    async fn first_visit_seeds_four_entries_once() -> Result<()> {
        let fixture = Fixture::signed_in("+15551234567").await?;

        let Json(first) = list_activity(
            Extension(fixture.auth.clone()),
            Extension(fixture.store.clone()),
            Query(fixture.query()),
            HeaderMap::new(),
        )
        .await?;
        let categories: Vec<_> = first.items.iter().map(|i| i.record.category).collect();
        assert_eq!(
            categories,
            vec![
                ActivityCategory::Travel,
                ActivityCategory::Payment,
                ActivityCategory::Cab,
                ActivityCategory::Grocery
            ]
        );
        assert!(first.items.iter().all(|i| i.record.user_id == "+15551234567"));

        let Json(second) = list_activity(
            Extension(fixture.auth.clone()),
            Extension(fixture.store.clone()),
            Query(fixture.query()),
            HeaderMap::new(),
        )
        .await?;
        assert_eq!(first.items, second.items);
        Ok(())
    }

    #[tokio::test]
    async fn existing_activity_is_not_reseeded() -> Result<()> {
        let fixture = Fixture::signed_in("+1").await?;
        let own = ActivityRecord {
            user_id: "+1".to_string(),
            category: ActivityCategory::Cab,
            title: "Airport run".to_string(),
            details: None,
            amount: None,
        };
        fixture
            .store
            .insert(ACTIVITY_COLLECTION, to_document(&own)?)
            .await?;

        let items = load_or_seed(fixture.store.as_ref(), "+1").await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].record, own);
        Ok(())
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() -> Result<()> {
        let fixture = Fixture::signed_in("+1").await?;
        let response = list_activity(
            Extension(fixture.auth.clone()),
            Extension(fixture.store.clone()),
            Query(TokenQuery::default()),
            HeaderMap::new(),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
