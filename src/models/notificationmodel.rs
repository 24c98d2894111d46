// models/notificationmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderConfirmed,
    OrderInProgress,
    OrderCompleted,
    OrderCancelled,
    PaymentReceived,
    PaymentFailed,
    NewMessage,
    NewReview,
    Reminder,
    Promotion,
}

impl NotificationType {
    pub fn to_str(&self) -> &str {
        match self {
            NotificationType::OrderConfirmed => "order_confirmed",
            NotificationType::OrderInProgress => "order_in_progress",
            NotificationType::OrderCompleted => "order_completed",
            NotificationType::OrderCancelled => "order_cancelled",
            NotificationType::PaymentReceived => "payment_received",
            NotificationType::PaymentFailed => "payment_failed",
            NotificationType::NewMessage => "new_message",
            NotificationType::NewReview => "new_review",
            NotificationType::Reminder => "reminder",
            NotificationType::Promotion => "promotion",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_order_id: Option<Uuid>,
    pub related_service_id: Option<Uuid>,
    pub is_read: bool,
    pub is_sent: bool,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A notification that has been decided on but not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_order_id: Option<Uuid>,
    pub related_service_id: Option<Uuid>,
    pub data: Option<serde_json::Value>,
}

impl NewNotification {
    pub fn new(
        recipient_id: Uuid,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        NewNotification {
            recipient_id,
            sender_id: None,
            notification_type,
            title: title.into(),
            message: message.into(),
            related_order_id: None,
            related_service_id: None,
            data: None,
        }
    }

    pub fn from_sender(mut self, sender_id: Uuid) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    pub fn for_order(mut self, order_id: Uuid) -> Self {
        self.related_order_id = Some(order_id);
        self
    }

    pub fn for_service(mut self, service_id: Uuid) -> Self {
        self.related_service_id = Some(service_id);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
