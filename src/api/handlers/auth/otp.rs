use axum::{Json, extract::Extension, extract::rejection::JsonRejection};
use std::sync::Arc;
use tracing::instrument;

use super::types::{RequestOtpRequest, RequestOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::{
    api::handlers::{ApiError, ErrorResponse},
    auth::AuthState,
};

#[utoipa::path(
    post,
    path = "/auth/request-otp",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Code issued", body = RequestOtpResponse),
        (status = 400, description = "Phone is missing or blank", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn request_otp(
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<RequestOtpRequest>, JsonRejection>,
) -> Result<Json<RequestOtpResponse>, ApiError> {
    let Json(request) = payload?;
    let issued = auth_state.otp().request(&request.phone).await?;

    Ok(Json(RequestOtpResponse {
        success: true,
        code: issued.code,
        expires_in: issued.expires_in,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted, session issued", body = VerifyOtpResponse),
        (status = 400, description = "Invalid code or code expired", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_otp(
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let Json(request) = payload?;
    let session = auth_state
        .otp()
        .verify(&request.phone, &request.code)
        .await?;

    Ok(Json(VerifyOtpResponse {
        success: true,
        token: session.token,
    }))
}
