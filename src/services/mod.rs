pub mod admin_service;
pub mod auth_service;
pub mod availability_service;
pub mod booking_service;
pub mod catalog_service;
pub mod package_service;
pub mod payment_service;
