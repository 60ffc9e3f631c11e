use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{
        BookingList, CreateBookingRequest, EarningsReport, UpdateBookingRequest,
    },
    entity::{
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings, Model as BookingModel},
        earnings_entries::{ActiveModel as EarningsActive, Column as EarningsCol, Entity as EarningsEntries, Model as EarningsModel},
        unavailable_dates::{ActiveModel as UnavailableActive, Column as UnavailableCol, Entity as UnavailableDates},
        users::{Column as UserCol, Entity as Users},
        services::Entity as Services,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Capability, ROLE_DECORATOR, require},
    models::{Booking, BookingStatus, EarningsEntry, PAYMENT_UNPAID},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Create an unpaid booking directly. The decorator's date is reserved
/// immediately: every non-cancelled booking blocks the date, paid or not.
pub async fn create_booking(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    require(user, Capability::BookServices)?;

    if payload.event_time.trim().is_empty() {
        return Err(AppError::BadRequest("event_time is required".into()));
    }
    if payload.event_location.trim().is_empty() {
        return Err(AppError::BadRequest("event_location is required".into()));
    }

    let customer = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let decorator = Users::find_by_id(payload.decorator_id)
        .one(&state.orm)
        .await?
        .filter(|u| u.role == ROLE_DECORATOR)
        .ok_or(AppError::NotFound)?;

    let service = Services::find_by_id(payload.service_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // The unavailable-dates set is the availability source of truth; check
    // it up front for a friendly error. The partial unique index on
    // bookings still backstops concurrent writers below.
    let taken = UnavailableDates::find_by_id((decorator.id, payload.event_date))
        .one(&state.orm)
        .await?
        .is_some();
    if taken {
        return Err(AppError::Conflict(
            "decorator already booked on this date".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer.id),
        customer_name: Set(customer.name.clone()),
        customer_image: Set(customer.image_url.clone()),
        customer_phone: Set(customer.phone.clone()),
        decorator_id: Set(decorator.id),
        decorator_name: Set(decorator.name.clone()),
        decorator_image: Set(decorator.image_url.clone()),
        decorator_phone: Set(decorator.phone.clone()),
        service_id: Set(service.id),
        service_name: Set(service.name.clone()),
        service_price: Set(service.price),
        service_category: Set(service.category.clone()),
        event_date: Set(payload.event_date),
        event_time: Set(payload.event_time.clone()),
        event_location: Set(payload.event_location.clone()),
        notes: Set(payload.notes.unwrap_or_default()),
        status: Set(BookingStatus::Pending.as_str().into()),
        payment_status: Set(PAYMENT_UNPAID.into()),
        transaction_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(map_booking_insert_err)?;

    reserve_event_date(&txn, decorator.id, payload.event_date).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_created",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Booking created",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

/// Admin-driven status transition with its side effects.
pub async fn transition_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: &str,
) -> AppResult<ApiResponse<Booking>> {
    require(user, Capability::TransitionAnyStatus)?;
    let to = BookingStatus::parse(status)
        .ok_or_else(|| AppError::BadRequest(format!("unknown booking status '{status}'")))?;

    let booking = apply_transition(state, user.user_id, id, to, None).await?;

    Ok(ApiResponse::success(
        "Booking status updated",
        booking,
        Some(Meta::empty()),
    ))
}

/// A customer may cancel their own booking; no other transition is open to
/// them.
pub async fn cancel_own_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    require(user, Capability::EditOwnBooking)?;

    let booking =
        apply_transition(state, user.user_id, id, BookingStatus::Cancelled, Some(user.user_id))
            .await?;

    Ok(ApiResponse::success(
        "Booking cancelled",
        booking,
        Some(Meta::empty()),
    ))
}

async fn apply_transition(
    state: &AppState,
    actor_id: Uuid,
    id: Uuid,
    to: BookingStatus,
    owner_only: Option<Uuid>,
) -> AppResult<Booking> {
    let txn = state.orm.begin().await?;

    let booking = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(owner) = owner_only {
        if booking.customer_id != owner {
            return Err(AppError::Forbidden);
        }
    }

    let from = BookingStatus::parse(&booking.status).ok_or_else(|| {
        AppError::InvalidState(format!("booking holds unrecognized status '{}'", booking.status))
    })?;
    if from.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "booking is {} and cannot change status",
            from.as_str()
        )));
    }
    if !from.can_transition(to) {
        return Err(AppError::InvalidState(format!(
            "cannot move booking from {} to {}",
            from.as_str(),
            to.as_str()
        )));
    }

    let decorator_id = booking.decorator_id;
    let event_date = booking.event_date;

    let mut active: BookingActive = booking.clone().into();
    active.status = Set(to.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    // Side effects are keyed on the edge, not the target state, so a
    // replayed request cannot apply them twice: the transition itself is
    // rejected above once the booking has left `from`.
    if to == BookingStatus::Assigned {
        credit_decorator_earnings(&txn, &updated).await?;
    }
    if to == BookingStatus::Cancelled {
        release_event_date(&txn, decorator_id, event_date, updated.id).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor_id),
        "booking_status_update",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": updated.id, "status": updated.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(booking_from_entity(updated))
}

/// Owner-only patch of schedule details while the booking is still open.
pub async fn edit_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    patch: UpdateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    require(user, Capability::EditOwnBooking)?;

    let txn = state.orm.begin().await?;

    let booking = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.customer_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let status = BookingStatus::parse(&booking.status).ok_or_else(|| {
        AppError::InvalidState(format!("booking holds unrecognized status '{}'", booking.status))
    })?;
    if status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "booking is {} and can no longer be edited",
            status.as_str()
        )));
    }

    let old_date = booking.event_date;
    let decorator_id = booking.decorator_id;
    let booking_id = booking.id;

    let mut active: BookingActive = booking.into();

    if let Some(new_date) = patch.event_date.filter(|d| *d != old_date) {
        let conflicting = Bookings::find()
            .filter(
                Condition::all()
                    .add(BookingCol::DecoratorId.eq(decorator_id))
                    .add(BookingCol::EventDate.eq(new_date))
                    .add(BookingCol::Status.ne(BookingStatus::Cancelled.as_str()))
                    .add(BookingCol::Id.ne(booking_id)),
            )
            .count(&txn)
            .await?;
        if conflicting > 0 {
            return Err(AppError::Conflict(
                "decorator already booked on this date".into(),
            ));
        }

        active.event_date = Set(new_date);
        release_event_date(&txn, decorator_id, old_date, booking_id).await?;
        reserve_event_date(&txn, decorator_id, new_date).await?;
    }

    if let Some(event_time) = patch.event_time {
        active.event_time = Set(event_time);
    }
    if let Some(event_location) = patch.event_location {
        active.event_location = Set(event_location);
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&txn).await.map_err(map_booking_insert_err)?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_edited",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": updated.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Booking updated",
        booking_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn my_bookings(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Bookings::find()
        .filter(BookingCol::CustomerId.eq(user.user_id))
        .order_by_desc(BookingCol::CreatedAt);

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
        "Ok",
        BookingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Bookings already routed to the decorator; pending ones are not theirs
/// yet.
pub async fn decorator_bookings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BookingList>> {
    require(user, Capability::ViewOwnSchedule)?;

    let items = Bookings::find()
        .filter(
            Condition::all()
                .add(BookingCol::DecoratorId.eq(user.user_id))
                .add(BookingCol::Status.ne(BookingStatus::Pending.as_str())),
        )
        .order_by_asc(BookingCol::EventDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        BookingList { items },
        Some(Meta::empty()),
    ))
}

pub async fn decorator_today(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BookingList>> {
    require(user, Capability::ViewOwnSchedule)?;

    let today = Utc::now().date_naive();
    let items = Bookings::find()
        .filter(
            Condition::all()
                .add(BookingCol::DecoratorId.eq(user.user_id))
                .add(BookingCol::EventDate.eq(today))
                .add(BookingCol::Status.ne(BookingStatus::Cancelled.as_str())),
        )
        .order_by_asc(BookingCol::EventTime)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        BookingList { items },
        Some(Meta::empty()),
    ))
}

pub async fn decorator_earnings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<EarningsReport>> {
    require(user, Capability::ViewOwnEarnings)?;

    let decorator = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let entries = EarningsEntries::find()
        .filter(EarningsCol::DecoratorId.eq(user.user_id))
        .order_by_desc(EarningsCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(earnings_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        EarningsReport {
            entries,
            total: decorator.earnings_total,
        },
        Some(Meta::empty()),
    ))
}

/// Append the date to the decorator's unavailable set; a no-op if some
/// other path already holds it.
pub(crate) async fn reserve_event_date(
    txn: &DatabaseTransaction,
    decorator_id: Uuid,
    date: NaiveDate,
) -> AppResult<()> {
    let res = UnavailableDates::insert(UnavailableActive {
        decorator_id: Set(decorator_id),
        date: Set(date),
    })
    .on_conflict(
        OnConflict::columns([UnavailableCol::DecoratorId, UnavailableCol::Date])
            .do_nothing()
            .to_owned(),
    )
    .exec(txn)
    .await;

    match res {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Drop the date from the unavailable set unless another active booking
/// for the decorator still occupies it.
pub(crate) async fn release_event_date(
    txn: &DatabaseTransaction,
    decorator_id: Uuid,
    date: NaiveDate,
    exclude_booking: Uuid,
) -> AppResult<()> {
    let still_held = Bookings::find()
        .filter(
            Condition::all()
                .add(BookingCol::DecoratorId.eq(decorator_id))
                .add(BookingCol::EventDate.eq(date))
                .add(BookingCol::Status.ne(BookingStatus::Cancelled.as_str()))
                .add(BookingCol::Id.ne(exclude_booking)),
        )
        .count(txn)
        .await?;

    if still_held == 0 {
        UnavailableDates::delete_many()
            .filter(
                Condition::all()
                    .add(UnavailableCol::DecoratorId.eq(decorator_id))
                    .add(UnavailableCol::Date.eq(date)),
            )
            .exec(txn)
            .await?;
    }
    Ok(())
}

/// Credit the decorator once for this booking. The unique ledger row per
/// booking makes the credit idempotent; the cached running total is only
/// bumped when the row actually lands.
pub(crate) async fn credit_decorator_earnings(
    txn: &DatabaseTransaction,
    booking: &BookingModel,
) -> AppResult<bool> {
    let res = EarningsEntries::insert(EarningsActive {
        id: Set(Uuid::new_v4()),
        decorator_id: Set(booking.decorator_id),
        booking_id: Set(booking.id),
        amount: Set(booking.service_price),
        description: Set(format!("Booking for {}", booking.service_name)),
        entry_date: Set(booking.event_date),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(EarningsCol::BookingId)
            .do_nothing()
            .to_owned(),
    )
    .exec(txn)
    .await;

    match res {
        Ok(_) => {
            Users::update_many()
                .col_expr(
                    UserCol::EarningsTotal,
                    Expr::col(UserCol::EarningsTotal).add(booking.service_price),
                )
                .filter(UserCol::Id.eq(booking.decorator_id))
                .exec(txn)
                .await?;
            Ok(true)
        }
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Map a bookings-table unique violation to the invariant it protects.
pub(crate) fn map_booking_insert_err(err: DbErr) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
        if msg.contains("bookings_decorator_active_date_key") {
            return AppError::Conflict("decorator already booked on this date".into());
        }
        if msg.contains("bookings_transaction_id_key") {
            return AppError::Conflict("booking already exists for this transaction".into());
        }
    }
    err.into()
}

pub(crate) fn booking_from_entity(model: BookingModel) -> Booking {
    Booking {
        id: model.id,
        customer_id: model.customer_id,
        customer_name: model.customer_name,
        customer_image: model.customer_image,
        customer_phone: model.customer_phone,
        decorator_id: model.decorator_id,
        decorator_name: model.decorator_name,
        decorator_image: model.decorator_image,
        decorator_phone: model.decorator_phone,
        service_id: model.service_id,
        service_name: model.service_name,
        service_price: model.service_price,
        service_category: model.service_category,
        event_date: model.event_date,
        event_time: model.event_time,
        event_location: model.event_location,
        notes: model.notes,
        status: model.status,
        payment_status: model.payment_status,
        transaction_id: model.transaction_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn earnings_from_entity(model: EarningsModel) -> EarningsEntry {
    EarningsEntry {
        id: model.id,
        decorator_id: model.decorator_id,
        booking_id: model.booking_id,
        amount: model.amount,
        description: model.description,
        entry_date: model.entry_date,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
