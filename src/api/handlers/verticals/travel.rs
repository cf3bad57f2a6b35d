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

const AIRLINE: &str = "IndiGo";
const BASE_PRICE: f64 = 99.0;
const PRICE_PER_CHAR: f64 = 5.5;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TravelSearch {
    pub from_city: String,
    pub to_city: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq)]
pub struct Flight {
    pub from: String,
    pub to: String,
    pub airline: String,
    pub price: f64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TravelResults {
    pub results: Vec<Flight>,
}

#[must_use]
pub fn flight_price(from_city: &str, to_city: &str) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let chars = (from_city.chars().count() + to_city.chars().count()) as f64;
    round2(BASE_PRICE + chars * PRICE_PER_CHAR)
}

#[utoipa::path(
    post,
    path = "/travel/search",
    params(TokenQuery),
    request_body = TravelSearch,
    responses(
        (status = 200, description = "Matching flights", body = TravelResults),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "verticals"
)]
#[instrument(skip_all)]
pub async fn travel_search(
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    payload: Result<Json<TravelSearch>, JsonRejection>,
) -> Result<Json<TravelResults>, ApiError> {
    require_session(&query, &headers, &auth_state).await?;
    let Json(search) = payload?;

    let price = flight_price(&search.from_city, &search.to_city);
    Ok(Json(TravelResults {
        results: vec![Flight {
            from: search.from_city,
            to: search.to_city,
            airline: AIRLINE.to_string(),
            price,
        }],
    }))
}
