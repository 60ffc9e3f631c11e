use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        bookings::{BookingList, DecoratorList, EarningsReport, UpdateBookingStatusRequest},
        packages::{CreatePackageRequest, PackageList},
        payments::{CheckoutSessionRequest, CheckoutSessionResponse, PaymentList, VerifyPaymentRequest},
        services::{CreateServiceRequest, ServiceList, UpdateServiceRequest},
    },
    models::{Booking, DecoratorProfile, EarningsEntry, Package, Payment, ServiceOffering, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, bookings, health, packages, params, payments, services},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        services::list_services,
        services::get_service,
        services::create_service,
        services::update_service,
        services::delete_service,
        packages::list_packages,
        packages::get_package,
        packages::create_package,
        bookings::create_booking,
        bookings::my_bookings,
        bookings::edit_booking,
        bookings::cancel_booking,
        bookings::available_decorators,
        bookings::decorator_bookings,
        bookings::decorator_today,
        bookings::decorator_earnings,
        payments::create_checkout_session,
        payments::verify_payment,
        admin::list_all_bookings,
        admin::get_booking_admin,
        admin::update_booking_status,
        admin::list_payments
    ),
    components(
        schemas(
            User,
            DecoratorProfile,
            ServiceOffering,
            Package,
            Booking,
            Payment,
            EarningsEntry,
            BookingList,
            DecoratorList,
            EarningsReport,
            UpdateBookingStatusRequest,
            ServiceList,
            CreateServiceRequest,
            UpdateServiceRequest,
            PackageList,
            CreatePackageRequest,
            PaymentList,
            CheckoutSessionRequest,
            CheckoutSessionResponse,
            VerifyPaymentRequest,
            params::Pagination,
            params::CatalogQuery,
            params::BookingListQuery,
            Meta,
            ApiResponse<Booking>,
            ApiResponse<BookingList>,
            ApiResponse<DecoratorList>,
            ApiResponse<ServiceList>,
            ApiResponse<PackageList>,
            ApiResponse<PaymentList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Services", description = "Decoration service catalog"),
        (name = "Packages", description = "Bundled offering catalog"),
        (name = "Bookings", description = "Booking lifecycle and availability"),
        (name = "Payments", description = "Checkout sessions and settlement verification"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
