use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::{bookings::BookingList, payments::PaymentList},
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        payments::{Column as PaymentCol, Entity as Payments, Model as PaymentModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, require},
    models::{Booking, Payment},
    response::{ApiResponse, Meta},
    routes::params::{BookingListQuery, Pagination, SortOrder},
    services::booking_service::booking_from_entity,
    state::AppState,
};

pub async fn list_all_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    require(user, Capability::ManageAllBookings)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(BookingCol::Status.eq(status.clone()));
    }

    let mut finder = Bookings::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(BookingCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(BookingCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Bookings",
        BookingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_booking_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    require(user, Capability::ManageAllBookings)?;

    let booking = Bookings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Booking found",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

pub async fn list_payments(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PaymentList>> {
    require(user, Capability::ManageAllBookings)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Payments::find().order_by_desc(PaymentCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(payment_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Payments",
        PaymentList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        transaction_id: model.transaction_id,
        booking_id: model.booking_id,
        customer_id: model.customer_id,
        decorator_id: model.decorator_id,
        service_name: model.service_name,
        amount: model.amount,
        currency: model.currency,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
