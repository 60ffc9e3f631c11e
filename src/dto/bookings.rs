use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Booking, DecoratorProfile, EarningsEntry};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub decorator_id: Uuid,
    pub service_id: Uuid,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub event_location: String,
    pub notes: Option<String>,
}

/// Patch for an editable booking; absent fields are left untouched.
#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateBookingRequest {
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailableDecoratorsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecoratorList {
    pub items: Vec<DecoratorProfile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EarningsReport {
    pub entries: Vec<EarningsEntry>,
    pub total: i64,
}
