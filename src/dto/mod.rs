pub mod auth;
pub mod bookings;
pub mod packages;
pub mod payments;
pub mod services;
