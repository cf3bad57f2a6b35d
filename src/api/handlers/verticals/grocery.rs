use axum::{
    extract::{Extension, Query, rejection::JsonRejection},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use super::round2;
use crate::{
    api::handlers::{
        ApiError, ErrorResponse,
        auth::principal::{TokenQuery, require_session},
    },
    auth::AuthState,
};

const DELIVERY_FEE: f64 = 3.99;
const PRICE_PER_ITEM: f64 = 2.5;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct GroceryCart {
    pub items: u32,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct GroceryOrder {
    pub total: f64,
    pub status: String,
}

#[must_use]
pub fn cart_total(items: u32) -> f64 {
    round2(DELIVERY_FEE + f64::from(items) * PRICE_PER_ITEM)
}

#[utoipa::path(
    post,
    path = "/grocery/checkout",
    params(TokenQuery),
    request_body = GroceryCart,
    responses(
        (status = 200, description = "Order created", body = GroceryOrder),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "verticals"
)]
#[instrument(skip_all)]
pub async fn grocery_checkout(
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    payload: Result<Json<GroceryCart>, JsonRejection>,
) -> Result<Json<GroceryOrder>, ApiError> {
    require_session(&query, &headers, &auth_state).await?;
    let Json(cart) = payload?;

    Ok(Json(GroceryOrder {
        total: cart_total(cart.items),
        status: "created".to_string(),
    }))
}
