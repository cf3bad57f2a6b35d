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

const BASE_FARE: f64 = 2.5;
const FARE_PER_TEN_CHARS: f64 = 1.2;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RideQuoteRequest {
    pub pickup: String,
    pub dropoff: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RideQuote {
    pub pickup: String,
    pub dropoff: String,
    pub fare: f64,
}

/// Fare grows with the combined length of the two addresses, in characters.
#[must_use]
pub fn quote_fare(pickup: &str, dropoff: &str) -> f64 {
    let chars = (pickup.chars().count() + dropoff.chars().count()).max(1);
    #[allow(clippy::cast_precision_loss)]
    let chars = chars as f64;
    round2(BASE_FARE + FARE_PER_TEN_CHARS * chars / 10.0)
}

#[utoipa::path(
    post,
    path = "/cab/quote",
    params(TokenQuery),
    request_body = RideQuoteRequest,
    responses(
        (status = 200, description = "Fare quote", body = RideQuote),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "verticals"
)]
#[instrument(skip_all)]
pub async fn cab_quote(
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    payload: Result<Json<RideQuoteRequest>, JsonRejection>,
) -> Result<Json<RideQuote>, ApiError> {
    require_session(&query, &headers, &auth_state).await?;
    let Json(request) = payload?;

    let fare = quote_fare(&request.pickup, &request.dropoff);
    Ok(Json(RideQuote {
        pickup: request.pickup,
        dropoff: request.dropoff,
        fare,
    }))
}
