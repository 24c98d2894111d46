// models/ordermodel.rs
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Refunded,
}

/// Which transition timestamp a status owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTimestamp {
    ConfirmedAt,
    StartedAt,
    CompletedAt,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Refunded => "Refunded",
        }
    }

    pub fn timestamp(&self) -> Option<StatusTimestamp> {
        match self {
            OrderStatus::Confirmed => Some(StatusTimestamp::ConfirmedAt),
            OrderStatus::InProgress => Some(StatusTimestamp::StartedAt),
            OrderStatus::Completed => Some(StatusTimestamp::CompletedAt),
            OrderStatus::Pending | OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid order status")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.to_str() == s)
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub status: OrderStatus,
    pub quantity: i32,
    pub total_amount: BigDecimal,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub duration_hours: i32,
    pub is_flexible_timing: bool,
    pub delivery_address: Option<String>,
    pub service_location: Option<String>,
    pub notes: Option<String>,
    pub special_requirements: Option<String>,
    pub provider_notes: Option<String>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
}

/// Per-user order counts for dashboards. `total_amount` sums completed orders.
#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub active_orders: i64,
    pub completed_orders: i64,
    pub total_amount: BigDecimal,
}

/// A status change as observed on one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub old: OrderStatus,
    pub new: OrderStatus,
}

impl StatusTransition {
    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

pub fn compute_total(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    unit_price * BigDecimal::from(quantity)
}

impl Order {
    /// Sets the status and stamps its transition timestamp if it is still unset.
    /// No ordering between statuses is enforced.
    pub fn apply_status(
        &mut self,
        new_status: OrderStatus,
        now: DateTime<Utc>,
    ) -> StatusTransition {
        let old = self.status;
        self.status = new_status;

        if let Some(field) = new_status.timestamp() {
            let slot = self.timestamp_slot(field);
            if slot.is_none() {
                *slot = Some(now);
            }
        }

        StatusTransition {
            old,
            new: new_status,
        }
    }

    /// Recomputes `total_amount` from the current unit price.
    pub fn recompute_total(&mut self, unit_price: &BigDecimal) {
        self.total_amount = compute_total(unit_price, self.quantity);
    }

    pub fn timestamp(&self, field: StatusTimestamp) -> Option<DateTime<Utc>> {
        match field {
            StatusTimestamp::ConfirmedAt => self.confirmed_at,
            StatusTimestamp::StartedAt => self.started_at,
            StatusTimestamp::CompletedAt => self.completed_at,
        }
    }

    fn timestamp_slot(&mut self, field: StatusTimestamp) -> &mut Option<DateTime<Utc>> {
        match field {
            StatusTimestamp::ConfirmedAt => &mut self.confirmed_at,
            StatusTimestamp::StartedAt => &mut self.started_at,
            StatusTimestamp::CompletedAt => &mut self.completed_at,
        }
    }

    pub fn can_be_cancelled(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        if matches!(self.status, OrderStatus::Completed | OrderStatus::Cancelled) {
            return false;
        }
        self.scheduled_date.map_or(false, |scheduled| now > scheduled)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.provider_id == user_id
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn order(client_id: Uuid, provider_id: Uuid, service_id: Uuid, total: BigDecimal) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            client_id,
            service_id,
            provider_id,
            status: OrderStatus::Pending,
            quantity: 1,
            total_amount: total,
            scheduled_date: None,
            duration_hours: 1,
            is_flexible_timing: false,
            delivery_address: None,
            service_location: None,
            notes: None,
            special_requirements: None,
            provider_notes: None,
            estimated_completion: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            started_at: None,
            completed_at: None,
            reminder_sent_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn pending_order() -> Order {
        fixtures::order(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), dec("50.00"))
    }

    #[test]
    fn every_status_value_parses() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        for raw in ["shipped", "Confirmed", "", "in progress", " confirmed ", "pending\n"] {
            assert_eq!(
                raw.parse::<OrderStatus>(),
                Err(UnknownOrderStatus(raw.to_string()))
            );
        }
    }

    #[test]
    fn total_is_price_times_quantity() {
        assert_eq!(compute_total(&dec("50.00"), 2), dec("100.00"));
        assert_eq!(compute_total(&dec("50.00"), 3), dec("150.00"));

        let mut order = pending_order();
        order.total_amount = dec("1.00");
        order.quantity = 4;
        order.recompute_total(&dec("12.50"));
        assert_eq!(order.total_amount, dec("50.00"));
    }

    #[test]
    fn timestamps_are_stamped_once() {
        let mut order = pending_order();
        let first = Utc::now();
        let later = first + Duration::hours(3);

        order.apply_status(OrderStatus::Confirmed, first);
        assert_eq!(order.confirmed_at, Some(first));

        let again = order.apply_status(OrderStatus::Confirmed, later);
        assert!(!again.is_change());
        assert_eq!(order.confirmed_at, Some(first));

        order.apply_status(OrderStatus::InProgress, later);
        order.apply_status(OrderStatus::Completed, later);
        assert_eq!(order.started_at, Some(later));
        assert_eq!(order.completed_at, Some(later));
    }

    #[test]
    fn backwards_transitions_are_not_blocked() {
        let mut order = pending_order();
        let now = Utc::now();
        order.apply_status(OrderStatus::Completed, now);

        let transition = order.apply_status(OrderStatus::Pending, now);
        assert_eq!(transition.old, OrderStatus::Completed);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.completed_at, Some(now));
    }

    #[test]
    fn statuses_without_timestamps_leave_them_untouched() {
        let mut order = pending_order();
        order.apply_status(OrderStatus::Cancelled, Utc::now());
        assert!(order.confirmed_at.is_none());
        assert!(order.started_at.is_none());
        assert!(order.completed_at.is_none());
    }

    #[test]
    fn cancellation_and_overdue_flags() {
        let now = Utc::now();
        let mut order = pending_order();
        assert!(order.can_be_cancelled());
        assert!(!order.is_overdue(now));

        order.scheduled_date = Some(now - Duration::hours(1));
        assert!(order.is_overdue(now));

        order.apply_status(OrderStatus::InProgress, now);
        assert!(!order.can_be_cancelled());

        order.apply_status(OrderStatus::Completed, now);
        assert!(!order.is_overdue(now));
    }
}
