pub mod audit_logs;
pub mod bookings;
pub mod earnings_entries;
pub mod packages;
pub mod payments;
pub mod services;
pub mod unavailable_dates;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use earnings_entries::Entity as EarningsEntries;
pub use packages::Entity as Packages;
pub use payments::Entity as Payments;
pub use services::Entity as Services;
pub use unavailable_dates::Entity as UnavailableDates;
pub use users::Entity as Users;
