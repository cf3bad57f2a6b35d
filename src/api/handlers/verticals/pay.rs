use axum::{
    extract::{Extension, Query, rejection::JsonRejection},
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    api::handlers::{
        ApiError, ErrorResponse,
        auth::principal::{TokenQuery, require_session},
    },
    auth::{AuthState, random_hex},
    store::{DocumentStore, to_document},
};

pub const PAYMENT_COLLECTION: &str = "payment";
const REFERENCE_BYTES: usize = 8;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    Wallet,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PaymentIntentRequest {
    pub amount: f64,
    #[serde(default)]
    pub method: PaymentMethod,
}

/// Persisted payment intent, keyed to the phone the session resolved to.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PaymentRecord {
    pub user_id: String,
    pub amount: f64,
    pub method: PaymentMethod,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PaymentIntent {
    #[serde(rename = "ref")]
    pub reference: String,
    pub status: String,
}

#[utoipa::path(
    post,
    path = "/pay/create-intent",
    params(TokenQuery),
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = PaymentIntent),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    tag = "verticals"
)]
#[instrument(skip_all)]
pub async fn create_payment_intent(
    auth_state: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn DocumentStore>>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    payload: Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> Result<Json<PaymentIntent>, ApiError> {
    let principal = require_session(&query, &headers, &auth_state).await?;
    let Json(request) = payload?;

    let record = PaymentRecord {
        user_id: principal.user_id,
        amount: request.amount,
        method: request.method,
        reference: random_hex(REFERENCE_BYTES)?,
    };
    store
        .insert(PAYMENT_COLLECTION, to_document(&record)?)
        .await?;
    info!(method = ?record.method, "Payment intent created");

    Ok(Json(PaymentIntent {
        reference: record.reference,
        status: "requires_confirmation".to_string(),
    }))
}
