// service/notification_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, notificationdb::NotificationExt},
    models::{
        chatmodel::{Conversation, Message},
        notificationmodel::{NewNotification, NotificationType},
        ordermodel::{Order, OrderStatus, StatusTransition},
        paymentmodel::{Payment, PaymentStatus},
        servicemodel::{Review, Service},
        usermodel::User,
    },
};

/// An order with the records its notifications are written from.
#[derive(Debug, Clone, Copy)]
pub struct OrderParties<'a> {
    pub order: &'a Order,
    pub service: &'a Service,
    pub client: &'a User,
    pub provider: &'a User,
}

impl<'a> OrderParties<'a> {
    fn to_client(&self, kind: NotificationType, title: &str, message: String) -> NewNotification {
        NewNotification::new(self.client.id, kind, title, message)
            .from_sender(self.provider.id)
            .for_order(self.order.id)
            .for_service(self.service.id)
    }

    fn to_provider(&self, kind: NotificationType, title: &str, message: String) -> NewNotification {
        NewNotification::new(self.provider.id, kind, title, message)
            .from_sender(self.client.id)
            .for_order(self.order.id)
            .for_service(self.service.id)
    }
}

pub fn order_status_notifications(
    parties: &OrderParties<'_>,
    transition: StatusTransition,
) -> Vec<NewNotification> {
    if !transition.is_change() {
        return Vec::new();
    }

    let order = parties.order;
    let service = parties.service.name.as_str();
    let provider = parties.provider.full_name();

    match transition.new {
        OrderStatus::Confirmed => vec![parties.to_client(
            NotificationType::OrderConfirmed,
            "Order Confirmed",
            format!("Your order for {} has been confirmed by {}", service, provider),
        )],
        OrderStatus::InProgress => vec![parties.to_client(
            NotificationType::OrderInProgress,
            "Service Started",
            format!("{} has started working on your order for {}", provider, service),
        )],
        OrderStatus::Completed => vec![
            parties.to_client(
                NotificationType::OrderCompleted,
                "Order Completed",
                format!("Your order for {} has been completed by {}", service, provider),
            ),
            parties.to_provider(
                NotificationType::OrderCompleted,
                "Order Completed",
                format!("Order #{} has been marked as completed", order.id),
            ),
        ],
        OrderStatus::Cancelled => {
            if matches!(transition.old, OrderStatus::Pending | OrderStatus::Confirmed) {
                vec![parties.to_client(
                    NotificationType::OrderCancelled,
                    "Order Cancelled",
                    format!("Your order for {} has been cancelled by {}", service, provider),
                )]
            } else {
                vec![parties.to_provider(
                    NotificationType::OrderCancelled,
                    "Order Cancelled",
                    format!("Order #{} has been cancelled by the client", order.id),
                )]
            }
        }
        OrderStatus::Pending | OrderStatus::Refunded => Vec::new(),
    }
}

pub fn payment_status_notifications(
    parties: &OrderParties<'_>,
    payment: &Payment,
    old: PaymentStatus,
    new: PaymentStatus,
) -> Vec<NewNotification> {
    if old == new {
        return Vec::new();
    }

    let order_id = parties.order.id;
    match new {
        PaymentStatus::Completed => vec![parties
            .to_provider(
                NotificationType::PaymentReceived,
                "Payment Received",
                format!(
                    "Payment of {} received for order #{}",
                    payment.amount.with_scale(2),
                    order_id
                ),
            )
            .with_data(serde_json::json!({
                "payment_id": payment.id,
                "payment_method": payment.payment_method.to_str(),
            }))],
        PaymentStatus::Failed => vec![parties.to_client(
            NotificationType::PaymentFailed,
            "Payment Failed",
            format!("Payment for order #{} has failed. Please try again.", order_id),
        )],
        _ => Vec::new(),
    }
}

/// `related_order` is the reviewing client's first order for the service.
pub fn review_notification(
    review: &Review,
    service: &Service,
    related_order: Option<Uuid>,
) -> NewNotification {
    let mut notification = NewNotification::new(
        review.provider_id,
        NotificationType::NewReview,
        "New Review Received",
        format!(
            "You received a {}-star review for {}",
            review.rating, service.name
        ),
    )
    .from_sender(review.client_id)
    .for_service(service.id);
    notification.related_order_id = related_order;
    notification
}

/// One notification per participant other than the author.
pub fn message_notifications(
    conversation: &Conversation,
    message: &Message,
    sender: &User,
    participant_ids: &[Uuid],
) -> Vec<NewNotification> {
    let sender_name = sender.full_name();

    participant_ids
        .iter()
        .filter(|id| **id != message.sender_id)
        .map(|recipient| {
            let mut notification = NewNotification::new(
                *recipient,
                NotificationType::NewMessage,
                "New Message",
                format!("{} sent you a message: {}", sender_name, conversation.subject),
            )
            .from_sender(sender.id)
            .with_data(serde_json::json!({
                "conversation_id": conversation.id,
                "message_id": message.id,
            }));
            notification.related_order_id = conversation.related_order_id;
            notification.related_service_id = conversation.related_service_id;
            notification
        })
        .collect()
}

pub fn reminder_notifications(order: &Order, service: &Service) -> Vec<NewNotification> {
    let message = format!(
        "Reminder: You have a service scheduled for tomorrow - {}",
        service.name
    );

    [order.client_id, order.provider_id]
        .into_iter()
        .map(|recipient| {
            let mut notification = NewNotification::new(
                recipient,
                NotificationType::Reminder,
                "Upcoming Service Reminder",
                message.clone(),
            )
            .for_order(order.id)
            .for_service(service.id);
            if let Some(scheduled) = order.scheduled_date {
                notification.data = Some(serde_json::json!({ "scheduled_date": scheduled }));
            }
            notification
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    /// Stores each notification. A failed insert is logged and skipped; the
    /// caller's mutation has already been persisted. Returns how many were stored.
    pub async fn dispatch(&self, notifications: Vec<NewNotification>) -> usize {
        let mut stored = 0;

        for notification in notifications {
            match self.db_client.create_notification(&notification).await {
                Ok(saved) => {
                    tracing::info!(
                        "notification {} ({}) -> user {}",
                        saved.id,
                        saved.notification_type.to_str(),
                        saved.recipient_id
                    );
                    stored += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "failed to store {} notification for user {}: {}",
                        notification.notification_type.to_str(),
                        notification.recipient_id,
                        e
                    );
                }
            }
        }

        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        chatmodel::MessageType,
        ordermodel::fixtures::order as order_fixture,
        paymentmodel::{fixtures::payment as payment_fixture, PaymentMethod},
        servicemodel::fixtures::service as service_fixture,
        usermodel::{fixtures::user, AccountType},
    };
    use chrono::Utc;
    use sqlx::types::BigDecimal;
    use std::str::FromStr;

    struct World {
        client: User,
        provider: User,
        service: Service,
        order: Order,
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn world() -> World {
        let client = user("wanjiku", "Wanjiku", "Kamau", AccountType::Client);
        let provider = user("otieno", "Otieno", "Ouma", AccountType::Provider);
        let service = service_fixture(provider.id, "House Cleaning", dec("50.00"));
        let order = order_fixture(client.id, provider.id, service.id, dec("50.00"));
        World {
            client,
            provider,
            service,
            order,
        }
    }

    fn parties(w: &World) -> OrderParties<'_> {
        OrderParties {
            order: &w.order,
            service: &w.service,
            client: &w.client,
            provider: &w.provider,
        }
    }

    fn transition(old: OrderStatus, new: OrderStatus) -> StatusTransition {
        StatusTransition { old, new }
    }

    #[test]
    fn confirmation_notifies_the_client_once() {
        let w = world();
        let sent = order_status_notifications(
            &parties(&w),
            transition(OrderStatus::Pending, OrderStatus::Confirmed),
        );

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, w.client.id);
        assert_eq!(sent[0].sender_id, Some(w.provider.id));
        assert_eq!(sent[0].title, "Order Confirmed");
        assert_eq!(
            sent[0].message,
            "Your order for House Cleaning has been confirmed by Otieno Ouma"
        );
        assert_eq!(sent[0].related_order_id, Some(w.order.id));
    }

    #[test]
    fn unchanged_status_sends_nothing() {
        let w = world();
        for status in OrderStatus::ALL {
            let sent = order_status_notifications(&parties(&w), transition(status, status));
            assert!(sent.is_empty());
        }
    }

    #[test]
    fn completion_notifies_both_parties() {
        let w = world();
        let sent = order_status_notifications(
            &parties(&w),
            transition(OrderStatus::InProgress, OrderStatus::Completed),
        );

        let recipients: Vec<Uuid> = sent.iter().map(|n| n.recipient_id).collect();
        assert_eq!(recipients, vec![w.client.id, w.provider.id]);
        assert!(sent.iter().all(|n| n.title == "Order Completed"));
        assert_eq!(
            sent[1].message,
            format!("Order #{} has been marked as completed", w.order.id)
        );
    }

    #[test]
    fn cancellation_recipient_depends_on_previous_status() {
        let w = world();

        let early = order_status_notifications(
            &parties(&w),
            transition(OrderStatus::Confirmed, OrderStatus::Cancelled),
        );
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].recipient_id, w.client.id);

        let late = order_status_notifications(
            &parties(&w),
            transition(OrderStatus::InProgress, OrderStatus::Cancelled),
        );
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].recipient_id, w.provider.id);
        assert_eq!(
            late[0].message,
            format!("Order #{} has been cancelled by the client", w.order.id)
        );
    }

    #[test]
    fn started_work_names_the_provider() {
        let w = world();
        let sent = order_status_notifications(
            &parties(&w),
            transition(OrderStatus::Confirmed, OrderStatus::InProgress),
        );
        assert_eq!(sent[0].title, "Service Started");
        assert_eq!(
            sent[0].message,
            "Otieno Ouma has started working on your order for House Cleaning"
        );
    }

    #[test]
    fn pending_and_refunded_are_silent() {
        let w = world();
        let p = parties(&w);
        for new in [OrderStatus::Pending, OrderStatus::Refunded] {
            let sent = order_status_notifications(&p, transition(OrderStatus::Completed, new));
            assert!(sent.is_empty());
        }
    }

    #[test]
    fn booking_confirm_complete_scenario() {
        let mut w = world();
        w.order.quantity = 2;
        w.order.recompute_total(&w.service.price);
        assert_eq!(w.order.total_amount, dec("100.00"));
        assert_eq!(w.order.status, OrderStatus::Pending);

        let confirmed = w.order.apply_status(OrderStatus::Confirmed, Utc::now());
        let sent = order_status_notifications(&parties(&w), confirmed);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Order Confirmed");
        assert_eq!(sent[0].recipient_id, w.client.id);

        let completed = w.order.apply_status(OrderStatus::Completed, Utc::now());
        let sent = order_status_notifications(&parties(&w), completed);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent.iter().filter(|n| n.recipient_id == w.client.id).count(), 1);
        assert_eq!(sent.iter().filter(|n| n.recipient_id == w.provider.id).count(), 1);
    }

    #[test]
    fn payment_completion_goes_to_provider() {
        let w = world();
        let payment = payment_fixture(w.order.id, dec("100"), PaymentMethod::Mpesa);
        let sent = payment_status_notifications(
            &parties(&w),
            &payment,
            PaymentStatus::Pending,
            PaymentStatus::Completed,
        );

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, w.provider.id);
        assert_eq!(sent[0].sender_id, Some(w.client.id));
        assert_eq!(
            sent[0].message,
            format!("Payment of 100.00 received for order #{}", w.order.id)
        );
    }

    #[test]
    fn payment_failure_goes_to_client() {
        let w = world();
        let payment = payment_fixture(w.order.id, dec("100"), PaymentMethod::Card);
        let sent = payment_status_notifications(
            &parties(&w),
            &payment,
            PaymentStatus::Processing,
            PaymentStatus::Failed,
        );
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, w.client.id);
        assert_eq!(sent[0].title, "Payment Failed");

        assert!(payment_status_notifications(
            &parties(&w),
            &payment,
            PaymentStatus::Completed,
            PaymentStatus::Completed
        )
        .is_empty());
    }

    #[test]
    fn review_notifies_provider() {
        let w = world();
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            service_id: w.service.id,
            client_id: w.client.id,
            provider_id: w.provider.id,
            rating: 4,
            comment: "Great".into(),
            is_verified: true,
            created_at: now,
            updated_at: now,
        };

        let n = review_notification(&review, &w.service, Some(w.order.id));
        assert_eq!(n.recipient_id, w.provider.id);
        assert_eq!(n.sender_id, Some(w.client.id));
        assert_eq!(n.related_order_id, Some(w.order.id));
        assert_eq!(n.related_service_id, Some(w.service.id));
        assert_eq!(n.message, "You received a 4-star review for House Cleaning");

        let without_order = review_notification(&review, &w.service, None);
        assert!(without_order.related_order_id.is_none());
    }

    #[test]
    fn messages_skip_the_author() {
        let w = world();
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            related_order_id: Some(w.order.id),
            related_service_id: None,
            subject: "Arrival time".into(),
            created_at: now,
            updated_at: now,
        };
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            sender_id: w.client.id,
            content: "What time will you arrive?".into(),
            message_type: MessageType::Text,
            attachment: None,
            is_read: false,
            created_at: now,
        };

        let sent = message_notifications(
            &conversation,
            &message,
            &w.client,
            &[w.client.id, w.provider.id],
        );
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, w.provider.id);
        assert_eq!(sent[0].message, "Wanjiku Kamau sent you a message: Arrival time");
        assert_eq!(sent[0].related_order_id, Some(w.order.id));
    }

    #[test]
    fn reminders_reach_both_parties() {
        let w = world();
        let sent = reminder_notifications(&w.order, &w.service);
        let recipients: Vec<Uuid> = sent.iter().map(|n| n.recipient_id).collect();
        assert_eq!(recipients, vec![w.client.id, w.provider.id]);
        assert!(sent.iter().all(|n| n.sender_id.is_none()));
        assert_eq!(
            sent[0].message,
            "Reminder: You have a service scheduled for tomorrow - House Cleaning"
        );
    }
}
