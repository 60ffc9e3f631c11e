use std::collections::HashMap;

use chrono::NaiveDate;
use decor_booking_api::{
    db::{create_orm_conn, create_pool},
    dto::payments::{CheckoutSessionRequest, VerifyPaymentRequest},
    entity::{
        bookings::Entity as Bookings, earnings_entries::Entity as EarningsEntries,
        payments::Entity as Payments, services::ActiveModel as ServiceActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    gateway::{BookingIntent, StripeGateway},
    middleware::auth::AuthUser,
    services::{availability_service, booking_service, payment_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set, Statement};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Integration flow against a stubbed gateway: open a checkout session, then
// verify the settled session twice. The second verification must resolve to
// the booking created first, with one payment record and one earnings credit.
#[tokio::test]
async fn checkout_verify_and_replay_flow() -> anyhow::Result<()> {
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

    let server = MockServer::start().await;
    let state = setup_state(&database_url, server.uri()).await?;

    let customer_id = create_user(&state, "user", "payer@example.com").await?;
    let decorator_id = create_user(&state, "decorator", "studio@example.com").await?;

    let service = ServiceActive {
        id: Set(Uuid::new_v4()),
        name: Set("Corporate Event Decor".into()),
        description: Set(None),
        category: Set("Corporate".into()),
        price: Set(150000),
        image_url: Set(String::new()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let customer = AuthUser {
        user_id: customer_id,
        role: "user".into(),
    };
    let decorator = AuthUser {
        user_id: decorator_id,
        role: "decorator".into(),
    };

    let event_date = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
    let intent = BookingIntent {
        customer_id,
        decorator_id,
        service_id: service.id,
        event_date,
        event_time: "11:00".into(),
        event_location: "Gulshan".into(),
        notes: String::new(),
        service_category: "Corporate".into(),
    };
    let metadata: HashMap<String, String> = intent.to_metadata().into_iter().collect();

    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .and(body_string_contains("mode=payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_flow",
            "url": "https://checkout.example/cs_test_flow"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_test_flow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_flow",
            "payment_status": "paid",
            "payment_intent": "pi_flow_1",
            "amount_total": 150000,
            "metadata": metadata.clone()
        })))
        .mount(&server)
        .await;

    // A different settled session for the same decorator and date.
    Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_same_date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_same_date",
            "payment_status": "paid",
            "payment_intent": "pi_flow_2",
            "amount_total": 150000,
            "metadata": metadata
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_unpaid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_unpaid",
            "payment_status": "unpaid",
            "payment_intent": null,
            "amount_total": null,
            "metadata": {}
        })))
        .mount(&server)
        .await;

    // Open the checkout session.
    let session = payment_service::create_checkout_session(
        &state,
        &customer,
        CheckoutSessionRequest {
            decorator_id,
            service_id: service.id,
            event_date,
            event_time: "11:00".into(),
            event_location: "Gulshan".into(),
            notes: None,
        },
    )
    .await?;
    let session = session.data.unwrap();
    assert_eq!(session.session_id, "cs_test_flow");
    assert_eq!(session.url, "https://checkout.example/cs_test_flow");

    // An unsettled session never creates a booking.
    let unpaid = payment_service::verify_and_book(
        &state,
        &customer,
        VerifyPaymentRequest {
            session_id: "cs_unpaid".into(),
        },
    )
    .await;
    assert!(matches!(unpaid, Err(AppError::PaymentNotVerified)));
    assert_eq!(Bookings::find().count(&state.orm).await?, 0);

    // First verification materializes the booking, paid and assigned.
    let verified = payment_service::verify_and_book(
        &state,
        &customer,
        VerifyPaymentRequest {
            session_id: "cs_test_flow".into(),
        },
    )
    .await?;
    let booking = verified.data.unwrap();
    assert_eq!(booking.status, "Assigned");
    assert_eq!(booking.payment_status, "paid");
    assert_eq!(booking.transaction_id.as_deref(), Some("pi_flow_1"));

    // Replaying the confirmation resolves to the same booking.
    let replayed = payment_service::verify_and_book(
        &state,
        &customer,
        VerifyPaymentRequest {
            session_id: "cs_test_flow".into(),
        },
    )
    .await?;
    assert_eq!(replayed.message, "Booking already exists");
    assert_eq!(replayed.data.unwrap().id, booking.id);

    assert_eq!(Bookings::find().count(&state.orm).await?, 1);
    assert_eq!(Payments::find().count(&state.orm).await?, 1);
    assert_eq!(EarningsEntries::find().count(&state.orm).await?, 1);

    // A second settled payment for the same decorator and date is refused
    // by the one-active-booking-per-date barrier, not recorded alongside.
    let double_booked = payment_service::verify_and_book(
        &state,
        &customer,
        VerifyPaymentRequest {
            session_id: "cs_same_date".into(),
        },
    )
    .await;
    assert!(matches!(double_booked, Err(AppError::Conflict(_))));

    assert_eq!(Bookings::find().count(&state.orm).await?, 1);
    assert_eq!(Payments::find().count(&state.orm).await?, 1);
    assert_eq!(EarningsEntries::find().count(&state.orm).await?, 1);

    // Earnings were credited exactly once and the date is now held.
    let earnings = booking_service::decorator_earnings(&state, &decorator).await?;
    assert_eq!(earnings.data.unwrap().total, 150000);

    let available = availability_service::available_decorators(&state, event_date).await?;
    assert!(
        !available
            .data
            .unwrap()
            .items
            .iter()
            .any(|d| d.id == decorator_id),
        "paid booking must reserve the decorator's date"
    );

    Ok(())
}

async fn setup_state(database_url: &str, gateway_url: String) -> anyhow::Result<AppState> {
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
        gateway: StripeGateway::new("sk_test".into(), gateway_url),
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
