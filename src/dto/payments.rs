use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Payment;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutSessionRequest {
    pub decorator_id: Uuid,
    pub service_id: Uuid,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub event_location: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub url: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentList {
    pub items: Vec<Payment>,
}
