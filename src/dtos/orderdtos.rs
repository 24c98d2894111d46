use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::page_offset;
use crate::models::ordermodel::Order;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderDto {
    pub service_id: Uuid,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    #[serde(default = "default_one")]
    pub quantity: i32,

    pub scheduled_date: Option<DateTime<Utc>>,

    #[validate(range(min = 1, message = "Duration must be at least 1 hour"))]
    #[serde(default = "default_one")]
    pub duration_hours: i32,

    #[serde(default)]
    pub is_flexible_timing: bool,

    #[validate(length(max = 500, message = "Delivery address is too long"))]
    pub delivery_address: Option<String>,

    #[validate(length(max = 200, message = "Service location is too long"))]
    pub service_location: Option<String>,

    pub notes: Option<String>,
    pub special_requirements: Option<String>,
}

fn default_one() -> i32 {
    1
}

/// Descriptive fields participants may change after booking.
#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrderDto {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Duration must be at least 1 hour"))]
    pub duration_hours: Option<i32>,
    pub is_flexible_timing: Option<bool>,
    #[validate(length(max = 500, message = "Delivery address is too long"))]
    pub delivery_address: Option<String>,
    #[validate(length(max = 200, message = "Service location is too long"))]
    pub service_location: Option<String>,
    pub notes: Option<String>,
    pub special_requirements: Option<String>,
    pub provider_notes: Option<String>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl UpdateOrderDto {
    pub fn apply_to(self, order: &mut Order) {
        if let Some(quantity) = self.quantity {
            order.quantity = quantity;
        }
        if let Some(duration) = self.duration_hours {
            order.duration_hours = duration;
        }
        if let Some(flexible) = self.is_flexible_timing {
            order.is_flexible_timing = flexible;
        }
        if self.scheduled_date.is_some() {
            order.scheduled_date = self.scheduled_date;
        }
        if self.estimated_completion.is_some() {
            order.estimated_completion = self.estimated_completion;
        }
        merge(&mut order.delivery_address, self.delivery_address);
        merge(&mut order.service_location, self.service_location);
        merge(&mut order.notes, self.notes);
        merge(&mut order.special_requirements, self.special_requirements);
        merge(&mut order.provider_notes, self.provider_notes);
    }
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusDto {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

impl OrderQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10) as i64
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.limit())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponseDto {
    #[serde(flatten)]
    pub order: Order,
    pub status_display: String,
    pub can_be_cancelled: bool,
    pub is_overdue: bool,
}

impl OrderResponseDto {
    pub fn new(order: Order, now: DateTime<Utc>) -> Self {
        OrderResponseDto {
            status_display: order.status.label().to_string(),
            can_be_cancelled: order.can_be_cancelled(),
            is_overdue: order.is_overdue(now),
            order,
        }
    }

    pub fn many(orders: Vec<Order>) -> Vec<Self> {
        let now = Utc::now();
        orders.into_iter().map(|o| OrderResponseDto::new(o, now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ordermodel::fixtures;
    use sqlx::types::BigDecimal;

    #[test]
    fn quantity_defaults_to_one_and_zero_is_rejected() {
        let dto: CreateOrderDto =
            serde_json::from_value(serde_json::json!({ "service_id": Uuid::new_v4() })).unwrap();
        assert_eq!(dto.quantity, 1);
        assert!(dto.validate().is_ok());

        let zero = CreateOrderDto { quantity: 0, ..dto };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let mut order = fixtures::order(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(50),
        );
        order.notes = Some("Bring a ladder".into());

        UpdateOrderDto {
            quantity: Some(3),
            provider_notes: Some("Arriving at 9".into()),
            ..Default::default()
        }
        .apply_to(&mut order);

        assert_eq!(order.quantity, 3);
        assert_eq!(order.notes.as_deref(), Some("Bring a ladder"));
        assert_eq!(order.provider_notes.as_deref(), Some("Arriving at 9"));
    }

    #[test]
    fn response_carries_display_flags() {
        let order = fixtures::order(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(50),
        );
        let json = serde_json::to_value(OrderResponseDto::new(order, Utc::now())).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["status_display"], "Pending");
        assert_eq!(json["can_be_cancelled"], true);
    }
}
