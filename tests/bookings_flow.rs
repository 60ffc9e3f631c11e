use chrono::NaiveDate;
use decor_booking_api::{
    db::{create_orm_conn, create_pool},
    dto::auth::RegisterRequest,
    dto::bookings::{CreateBookingRequest, UpdateBookingRequest},
    entity::{
        bookings::Entity as Bookings, services::ActiveModel as ServiceActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    gateway::StripeGateway,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::{auth_service, availability_service, booking_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use uuid::Uuid;

// Integration flow: customer books a decorator -> the date disappears from
// availability -> a second booking on the date conflicts -> moving the date
// frees the old one -> admin assigns the booking and earnings are credited
// exactly once -> cancellation releases the date.
#[tokio::test]
async fn booking_lifecycle_and_availability_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    // Registering the same email twice is a conflict, not a validation error.
    auth_service::register_user(
        &state,
        RegisterRequest {
            name: "First".into(),
            email: "taken@example.com".into(),
            password: "secret123".into(),
            phone: None,
            role: None,
        },
    )
    .await?;
    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Second".into(),
            email: "taken@example.com".into(),
            password: "secret456".into(),
            phone: None,
            role: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let customer_id = create_user(&state, "user", "customer@example.com").await?;
    let other_customer_id = create_user(&state, "user", "other@example.com").await?;
    let decorator_id = create_user(&state, "decorator", "decorator@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;

    let service = ServiceActive {
        id: Set(Uuid::new_v4()),
        name: Set("Wedding Stage".into()),
        description: Set(Some("Stage with floral backdrop".into())),
        category: Set("Wedding".into()),
        price: Set(250000),
        image_url: Set(String::new()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let customer = AuthUser {
        user_id: customer_id,
        role: "user".into(),
    };
    let other_customer = AuthUser {
        user_id: other_customer_id,
        role: "user".into(),
    };
    let decorator = AuthUser {
        user_id: decorator_id,
        role: "decorator".into(),
    };
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let event_date = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();

    // Create an unpaid booking.
    let created = booking_service::create_booking(
        &state,
        &customer,
        CreateBookingRequest {
            decorator_id,
            service_id: service.id,
            event_date,
            event_time: "18:00".into(),
            event_location: "Dhaka".into(),
            notes: Some("stage flowers".into()),
        },
    )
    .await?;
    let booking = created.data.unwrap();
    assert_eq!(booking.status, "pending");
    assert_eq!(booking.service_price, 250000);
    assert_eq!(booking.decorator_id, decorator_id);

    // The decorator no longer shows as available on that date.
    let available = availability_service::available_decorators(&state, event_date).await?;
    assert!(
        !available
            .data
            .unwrap()
            .items
            .iter()
            .any(|d| d.id == decorator_id),
        "booked decorator must not appear as available"
    );

    // A second booking for the same decorator and date is refused.
    let conflict = booking_service::create_booking(
        &state,
        &other_customer,
        CreateBookingRequest {
            decorator_id,
            service_id: service.id,
            event_date,
            event_time: "10:00".into(),
            event_location: "Chattogram".into(),
            notes: None,
        },
    )
    .await;
    assert!(matches!(conflict, Err(AppError::Conflict(_))));

    // Moving the booking frees the old date and holds the new one.
    let new_date = NaiveDate::from_ymd_opt(2025, 7, 11).unwrap();
    let edited = booking_service::edit_booking(
        &state,
        &customer,
        booking.id,
        UpdateBookingRequest {
            event_date: Some(new_date),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(edited.data.unwrap().event_date, new_date);

    let freed = availability_service::available_decorators(&state, event_date).await?;
    assert!(
        freed
            .data
            .unwrap()
            .items
            .iter()
            .any(|d| d.id == decorator_id),
        "old date must be free again after the move"
    );

    // Only the owner may edit.
    let foreign_edit = booking_service::edit_booking(
        &state,
        &other_customer,
        booking.id,
        UpdateBookingRequest {
            notes: Some("hijack".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(foreign_edit, Err(AppError::Forbidden)));

    // Another active booking on a third date blocks moving this one onto it,
    // and the refused edit leaves the booking where it was.
    let blocked_date = NaiveDate::from_ymd_opt(2025, 7, 12).unwrap();
    booking_service::create_booking(
        &state,
        &other_customer,
        CreateBookingRequest {
            decorator_id,
            service_id: service.id,
            event_date: blocked_date,
            event_time: "09:00".into(),
            event_location: "Sylhet".into(),
            notes: None,
        },
    )
    .await?;

    let conflicting_move = booking_service::edit_booking(
        &state,
        &customer,
        booking.id,
        UpdateBookingRequest {
            event_date: Some(blocked_date),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(conflicting_move, Err(AppError::Conflict(_))));

    let unchanged = Bookings::find_by_id(booking.id)
        .one(&state.orm)
        .await?
        .expect("booking still present");
    assert_eq!(unchanged.event_date, new_date, "refused edit must not move the date");

    // Admin assigns the booking; the decorator is credited once.
    let assigned = booking_service::transition_status(&state, &admin, booking.id, "Assigned").await?;
    assert_eq!(assigned.data.unwrap().status, "Assigned");

    let earnings = booking_service::decorator_earnings(&state, &decorator).await?;
    let report = earnings.data.unwrap();
    assert_eq!(report.total, 250000);
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].booking_id, booking.id);

    // Replaying the same transition is rejected and does not credit again.
    let replay = booking_service::transition_status(&state, &admin, booking.id, "Assigned").await;
    assert!(matches!(replay, Err(AppError::InvalidState(_))));

    let earnings_after = booking_service::decorator_earnings(&state, &decorator).await?;
    assert_eq!(earnings_after.data.unwrap().total, 250000);

    // Cancellation releases the held date.
    let cancelled = booking_service::cancel_own_booking(&state, &customer, booking.id).await?;
    assert_eq!(cancelled.data.unwrap().status, "cancelled");

    let released = availability_service::available_decorators(&state, new_date).await?;
    assert!(
        released
            .data
            .unwrap()
            .items
            .iter()
            .any(|d| d.id == decorator_id),
        "cancelled booking must release the date"
    );

    // Terminal bookings admit no further edits or transitions.
    let late_edit = booking_service::edit_booking(
        &state,
        &customer,
        booking.id,
        UpdateBookingRequest {
            notes: Some("too late".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(late_edit, Err(AppError::InvalidState(_))));

    // The customer still sees the booking in their history.
    let mine = booking_service::my_bookings(
        &state,
        &customer,
        Pagination {
            page: Some(1),
            per_page: Some(20),
        },
    )
    .await?;
    assert_eq!(mine.data.unwrap().items.len(), 1);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let orm = create_orm_conn(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE earnings_entries, payments, decorator_unavailable_dates, bookings, packages, services, audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        gateway: StripeGateway::new("sk_test".into(), "http://127.0.0.1:9".into()),
        frontend_uri: "http://localhost:3000".into(),
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{email} {role}")),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        phone: Set("0170000000".into()),
        image_url: Set(String::new()),
        role: Set(role.into()),
        specialty: Set(String::new()),
        earnings_total: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
