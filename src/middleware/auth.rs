use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError};

pub const ROLE_USER: &str = "user";
pub const ROLE_DECORATOR: &str = "decorator";
pub const ROLE_ADMIN: &str = "admin";

/// What an actor is allowed to do. Each service operation checks exactly
/// one capability at its boundary instead of comparing role strings inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    BookServices,
    EditOwnBooking,
    ViewOwnSchedule,
    ViewOwnEarnings,
    ManageCatalog,
    ManageAllBookings,
    TransitionAnyStatus,
}

fn capabilities_for(role: &str) -> &'static [Capability] {
    match role {
        ROLE_ADMIN => &[
            Capability::ManageCatalog,
            Capability::ManageAllBookings,
            Capability::TransitionAnyStatus,
        ],
        ROLE_DECORATOR => &[Capability::ViewOwnSchedule, Capability::ViewOwnEarnings],
        ROLE_USER => &[Capability::BookServices, Capability::EditOwnBooking],
        _ => &[],
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn can(&self, capability: Capability) -> bool {
        capabilities_for(&self.role).contains(&capability)
    }
}

pub fn require(user: &AuthUser, capability: Capability) -> Result<(), AppError> {
    if user.can(capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::BadRequest("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::BadRequest("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: &str) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: role.into(),
        }
    }

    #[test]
    fn admin_manages_bookings_but_cannot_book_for_customers() {
        let admin = actor(ROLE_ADMIN);
        assert!(admin.can(Capability::ManageAllBookings));
        assert!(admin.can(Capability::TransitionAnyStatus));
        assert!(!admin.can(Capability::BookServices));
    }

    #[test]
    fn customer_books_and_edits_own_bookings_only() {
        let customer = actor(ROLE_USER);
        assert!(customer.can(Capability::BookServices));
        assert!(customer.can(Capability::EditOwnBooking));
        assert!(!customer.can(Capability::TransitionAnyStatus));
        assert!(!customer.can(Capability::ManageCatalog));
    }

    #[test]
    fn decorator_sees_own_schedule_and_earnings() {
        let decorator = actor(ROLE_DECORATOR);
        assert!(decorator.can(Capability::ViewOwnSchedule));
        assert!(decorator.can(Capability::ViewOwnEarnings));
        assert!(!decorator.can(Capability::EditOwnBooking));
    }

    #[test]
    fn unknown_role_has_no_capabilities() {
        let stranger = actor("support");
        assert!(matches!(
            require(&stranger, Capability::BookServices),
            Err(AppError::Forbidden)
        ));
    }
}
