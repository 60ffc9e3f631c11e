use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payments::{CheckoutSessionRequest, CheckoutSessionResponse, VerifyPaymentRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Booking,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout-session", post(create_checkout_session))
        .route("/verify", post(verify_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/checkout-session",
    request_body = CheckoutSessionRequest,
    responses(
        (status = 200, description = "Open a gateway checkout session", body = ApiResponse<CheckoutSessionResponse>),
        (status = 404, description = "Decorator or service not found"),
        (status = 409, description = "Decorator already booked on this date"),
        (status = 502, description = "Gateway unreachable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutSessionRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSessionResponse>>> {
    let resp = payment_service::create_checkout_session(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Verify settlement and materialize the booking", body = ApiResponse<Booking>),
        (status = 402, description = "Payment not verified"),
        (status = 404, description = "Referenced entities no longer exist"),
        (status = 502, description = "Gateway unreachable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = payment_service::verify_and_book(&state, &user, payload).await?;
    Ok(Json(resp))
}
