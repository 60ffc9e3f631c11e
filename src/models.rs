use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub image_url: String,
    pub role: String,
    pub specialty: String,
    pub earnings_total: i64,
    pub created_at: DateTime<Utc>,
}

/// Decorator as exposed to customers: credentials and ledgers stripped.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecoratorProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub image_url: String,
    pub specialty: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// A customer's engagement of one decorator for one service on one date.
///
/// Customer, decorator and service display fields are snapshots taken at
/// creation time so the record stays meaningful if the referenced rows
/// change later. They are never refreshed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_image: String,
    pub customer_phone: String,
    pub decorator_id: Uuid,
    pub decorator_name: String,
    pub decorator_image: String,
    pub decorator_phone: String,
    pub service_id: Uuid,
    pub service_name: String,
    pub service_price: i64,
    pub service_category: String,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub event_location: String,
    pub notes: String,
    pub status: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub transaction_id: String,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub decorator_id: Uuid,
    pub service_name: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EarningsEntry {
    pub id: Uuid,
    pub decorator_id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

pub const PAYMENT_UNPAID: &str = "unpaid";
pub const PAYMENT_PAID: &str = "paid";

/// Booking lifecycle states. The stored strings are kept as-is for API
/// compatibility, including the mixed-case progress phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum BookingStatus {
    Pending,
    /// Legacy value: still parseable, but no transition targets it.
    Confirmed,
    Assigned,
    PlanningPhase,
    MaterialsPrepared,
    OnTheWayToVenue,
    SetupInProgress,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "Assigned",
            BookingStatus::PlanningPhase => "Planning Phase",
            BookingStatus::MaterialsPrepared => "Materials Prepared",
            BookingStatus::OnTheWayToVenue => "On the Way to Venue",
            BookingStatus::SetupInProgress => "Setup in Progress",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "Assigned" => Some(BookingStatus::Assigned),
            "Planning Phase" => Some(BookingStatus::PlanningPhase),
            "Materials Prepared" => Some(BookingStatus::MaterialsPrepared),
            "On the Way to Venue" => Some(BookingStatus::OnTheWayToVenue),
            "Setup in Progress" => Some(BookingStatus::SetupInProgress),
            "in-progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    fn is_progress_phase(&self) -> bool {
        matches!(
            self,
            BookingStatus::PlanningPhase
                | BookingStatus::MaterialsPrepared
                | BookingStatus::OnTheWayToVenue
                | BookingStatus::SetupInProgress
                | BookingStatus::InProgress
        )
    }

    /// Whether `self -> to` is a legal edge of the lifecycle.
    ///
    /// Re-setting the current status is treated as illegal rather than a
    /// no-op so that side effects (earnings credit, date release) can never
    /// be replayed through this path.
    pub fn can_transition(&self, to: BookingStatus) -> bool {
        if self.is_terminal() || to == *self {
            return false;
        }
        match self {
            BookingStatus::Pending => {
                matches!(to, BookingStatus::Assigned | BookingStatus::Cancelled)
            }
            BookingStatus::Assigned => {
                to.is_progress_phase()
                    || matches!(to, BookingStatus::Completed | BookingStatus::Cancelled)
            }
            s if s.is_progress_phase() => {
                to.is_progress_phase()
                    || matches!(to, BookingStatus::Completed | BookingStatus::Cancelled)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for s in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Assigned,
            BookingStatus::PlanningPhase,
            BookingStatus::MaterialsPrepared,
            BookingStatus::OnTheWayToVenue,
            BookingStatus::SetupInProgress,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BookingStatus::parse("shipped"), None);
    }

    #[test]
    fn pending_can_only_be_assigned_or_cancelled() {
        let from = BookingStatus::Pending;
        assert!(from.can_transition(BookingStatus::Assigned));
        assert!(from.can_transition(BookingStatus::Cancelled));
        assert!(!from.can_transition(BookingStatus::Completed));
        assert!(!from.can_transition(BookingStatus::PlanningPhase));
        assert!(!from.can_transition(BookingStatus::Confirmed));
    }

    #[test]
    fn assigned_moves_into_progress_or_closes() {
        let from = BookingStatus::Assigned;
        assert!(from.can_transition(BookingStatus::PlanningPhase));
        assert!(from.can_transition(BookingStatus::SetupInProgress));
        assert!(from.can_transition(BookingStatus::InProgress));
        assert!(from.can_transition(BookingStatus::Completed));
        assert!(from.can_transition(BookingStatus::Cancelled));
        assert!(!from.can_transition(BookingStatus::Pending));
    }

    #[test]
    fn progress_phases_advance_or_close() {
        let from = BookingStatus::MaterialsPrepared;
        assert!(from.can_transition(BookingStatus::OnTheWayToVenue));
        assert!(from.can_transition(BookingStatus::Completed));
        assert!(from.can_transition(BookingStatus::Cancelled));
        assert!(!from.can_transition(BookingStatus::Assigned));
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for from in [BookingStatus::Completed, BookingStatus::Cancelled] {
            for to in [
                BookingStatus::Pending,
                BookingStatus::Assigned,
                BookingStatus::InProgress,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ] {
                assert!(!from.can_transition(to), "{from:?} -> {to:?} must fail");
            }
        }
    }

    #[test]
    fn reassigning_same_status_is_not_a_transition() {
        assert!(!BookingStatus::Assigned.can_transition(BookingStatus::Assigned));
    }

    #[test]
    fn nothing_transitions_into_legacy_confirmed() {
        for from in [
            BookingStatus::Pending,
            BookingStatus::Assigned,
            BookingStatus::InProgress,
        ] {
            assert!(!from.can_transition(BookingStatus::Confirmed));
        }
    }
}
