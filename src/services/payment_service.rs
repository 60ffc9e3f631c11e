use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{CheckoutSessionRequest, CheckoutSessionResponse, VerifyPaymentRequest},
    entity::{
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings, Model as BookingModel},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        services::Entity as Services,
        unavailable_dates::Entity as UnavailableDates,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    gateway::{BookingIntent, CheckoutLineItem},
    middleware::auth::{AuthUser, Capability, ROLE_DECORATOR, require},
    models::{Booking, BookingStatus, PAYMENT_PAID},
    response::{ApiResponse, Meta},
    services::booking_service::{
        booking_from_entity, credit_decorator_earnings, map_booking_insert_err,
        reserve_event_date,
    },
    state::AppState,
};

const SESSION_PAID: &str = "paid";

/// Open a gateway checkout session carrying the booking intent in its
/// metadata. Nothing is written to the ledger until the session settles.
pub async fn create_checkout_session(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutSessionRequest,
) -> AppResult<ApiResponse<CheckoutSessionResponse>> {
    require(user, Capability::BookServices)?;

    if payload.event_time.trim().is_empty() {
        return Err(AppError::BadRequest("event_time is required".into()));
    }

    let decorator = Users::find_by_id(payload.decorator_id)
        .one(&state.orm)
        .await?
        .filter(|u| u.role == ROLE_DECORATOR)
        .ok_or(AppError::NotFound)?;

    let service = Services::find_by_id(payload.service_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let taken = UnavailableDates::find_by_id((decorator.id, payload.event_date))
        .one(&state.orm)
        .await?
        .is_some();
    if taken {
        return Err(AppError::Conflict(
            "decorator already booked on this date".into(),
        ));
    }

    let intent = BookingIntent {
        customer_id: user.user_id,
        decorator_id: decorator.id,
        service_id: service.id,
        event_date: payload.event_date,
        event_time: payload.event_time,
        event_location: payload.event_location,
        notes: payload.notes.unwrap_or_default(),
        service_category: service.category.clone(),
    };

    let item = CheckoutLineItem {
        name: service.name.clone(),
        amount: service.price,
        currency: "BDT".into(),
    };
    let success_url = format!(
        "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}",
        state.frontend_uri
    );
    let cancel_url = format!("{}/services/{}", state.frontend_uri, service.id);

    let created = state
        .gateway
        .create_checkout_session(&item, &success_url, &cancel_url, &intent)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout_session_created",
        Some("payments"),
        Some(serde_json::json!({ "session_id": created.id, "service_id": service.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout session created",
        CheckoutSessionResponse {
            url: created.url,
            session_id: created.id,
        },
        Some(Meta::empty()),
    ))
}

/// Verify a settled session with the gateway, then materialize the booking,
/// its payment audit record, the decorator's reserved date and the earnings
/// credit in one transaction.
///
/// Safe to retry: the session's payment reference is a unique transaction
/// id on bookings, so a redelivered confirmation resolves to the booking
/// created first.
pub async fn verify_and_book(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<Booking>> {
    if payload.session_id.trim().is_empty() {
        return Err(AppError::BadRequest("session_id is required".into()));
    }

    let session = state.gateway.retrieve_session(&payload.session_id).await?;
    if session.payment_status != SESSION_PAID {
        return Err(AppError::PaymentNotVerified);
    }
    let transaction_id = session
        .payment_intent
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or(AppError::PaymentNotVerified)?;

    if let Some(existing) = find_by_transaction(state, &transaction_id).await? {
        return Ok(ApiResponse::success(
            "Booking already exists",
            booking_from_entity(existing),
            Some(Meta::empty()),
        ));
    }

    let intent = BookingIntent::from_metadata(&session.metadata)?;

    let customer = Users::find_by_id(intent.customer_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let decorator = Users::find_by_id(intent.decorator_id)
        .one(&state.orm)
        .await?
        .filter(|u| u.role == ROLE_DECORATOR)
        .ok_or(AppError::NotFound)?;
    let service = Services::find_by_id(intent.service_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let amount = session.amount_total.unwrap_or(service.price);

    let txn = state.orm.begin().await?;

    let inserted = BookingActive {
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
        service_price: Set(amount),
        service_category: Set(intent.service_category.clone()),
        event_date: Set(intent.event_date),
        event_time: Set(intent.event_time.clone()),
        event_location: Set(intent.event_location.clone()),
        notes: Set(intent.notes.clone()),
        status: Set(BookingStatus::Assigned.as_str().into()),
        payment_status: Set(PAYMENT_PAID.into()),
        transaction_id: Set(Some(transaction_id.clone())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await;

    let booking = match inserted {
        Ok(b) => b,
        Err(err) => {
            txn.rollback().await.ok();
            // A concurrent delivery of the same confirmation wins the
            // transaction-id race; hand back its booking instead.
            if is_transaction_id_conflict(&err) {
                if let Some(existing) = find_by_transaction(state, &transaction_id).await? {
                    return Ok(ApiResponse::success(
                        "Booking already exists",
                        booking_from_entity(existing),
                        Some(Meta::empty()),
                    ));
                }
            }
            return Err(map_booking_insert_err(err));
        }
    };

    reserve_event_date(&txn, decorator.id, intent.event_date).await?;
    record_payment(&txn, &booking, amount).await?;
    credit_decorator_earnings(&txn, &booking).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_booking_created",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "transaction_id": transaction_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment verified and booking created",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

async fn find_by_transaction(
    state: &AppState,
    transaction_id: &str,
) -> AppResult<Option<BookingModel>> {
    let existing = Bookings::find()
        .filter(BookingCol::TransactionId.eq(transaction_id))
        .one(&state.orm)
        .await?;
    Ok(existing)
}

async fn record_payment(
    txn: &sea_orm::DatabaseTransaction,
    booking: &BookingModel,
    amount: i64,
) -> AppResult<()> {
    let transaction_id = booking
        .transaction_id
        .clone()
        .ok_or_else(|| AppError::InvalidState("paid booking without transaction id".into()))?;

    let res = Payments::insert(PaymentActive {
        id: Set(Uuid::new_v4()),
        transaction_id: Set(transaction_id),
        booking_id: Set(booking.id),
        customer_id: Set(booking.customer_id),
        decorator_id: Set(booking.decorator_id),
        service_name: Set(booking.service_name.clone()),
        amount: Set(amount),
        currency: Set("BDT".into()),
        status: Set(PAYMENT_PAID.into()),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(PaymentCol::TransactionId)
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

fn is_transaction_id_conflict(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("bookings_transaction_id_key")
    )
}
