use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::bookings::{
        AvailableDecoratorsQuery, BookingList, CreateBookingRequest, DecoratorList,
        EarningsReport, UpdateBookingRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Booking,
    response::ApiResponse,
    routes::params::Pagination,
    services::{availability_service, booking_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/mine", get(my_bookings))
        .route("/{id}", patch(edit_booking))
        .route("/{id}/cancel", post(cancel_booking))
        .route("/decorators/available", get(available_decorators))
        .route("/decorator/assigned", get(decorator_bookings))
        .route("/decorator/today", get(decorator_today))
        .route("/decorator/earnings", get(decorator_earnings))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Create a direct (unpaid) booking", body = ApiResponse<Booking>),
        (status = 400, description = "Missing fields"),
        (status = 404, description = "Decorator or service not found"),
        (status = 409, description = "Decorator already booked on this date"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::create_booking(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/mine",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "The caller's bookings", body = ApiResponse<BookingList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::my_bookings(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Edit schedule details of an open booking", body = ApiResponse<Booking>),
        (status = 403, description = "Not the booking owner"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Decorator already booked on the new date"),
        (status = 422, description = "Booking is completed or cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn edit_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::edit_booking(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Cancel own booking", body = ApiResponse<Booking>),
        (status = 403, description = "Not the booking owner"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Booking already closed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::cancel_own_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/decorators/available",
    params(("date" = String, Query, description = "Calendar date (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Decorators free on the date", body = ApiResponse<DecoratorList>),
    ),
    tag = "Bookings"
)]
pub async fn available_decorators(
    State(state): State<AppState>,
    Query(query): Query<AvailableDecoratorsQuery>,
) -> AppResult<Json<ApiResponse<DecoratorList>>> {
    let resp = availability_service::available_decorators(&state, query.date).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/decorator/assigned",
    responses(
        (status = 200, description = "Non-pending bookings routed to the decorator", body = ApiResponse<BookingList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn decorator_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::decorator_bookings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/decorator/today",
    responses(
        (status = 200, description = "Today's active bookings for the decorator", body = ApiResponse<BookingList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn decorator_today(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::decorator_today(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/decorator/earnings",
    responses(
        (status = 200, description = "The decorator's earnings ledger and running total", body = ApiResponse<EarningsReport>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn decorator_earnings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<EarningsReport>>> {
    let resp = booking_service::decorator_earnings(&state, &user).await?;
    Ok(Json(resp))
}
