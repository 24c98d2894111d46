// service/order_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::{db::DBClient, orderdb::OrderExt, servicedb::ServiceExt, userdb::UserExt},
    dtos::orderdtos::{CreateOrderDto, OrderQuery, UpdateOrderDto},
    models::{
        notificationmodel::NewNotification,
        ordermodel::{compute_total, Order, OrderStatus, StatusTransition},
        servicemodel::Service,
        usermodel::User,
    },
    service::{
        actor::Actor,
        error::ServiceError,
        notification_service::{order_status_notifications, NotificationService, OrderParties},
    },
};

#[derive(Debug, Clone)]
pub struct OrderService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl OrderService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn book_order(
        &self,
        client: &User,
        dto: CreateOrderDto,
    ) -> Result<Order, ServiceError> {
        if !client.is_client() {
            return Err(ServiceError::Unauthorized(
                "Only client accounts can book services".to_string(),
            ));
        }

        let service = self.load_service(dto.service_id).await?;

        if !service.is_available {
            return Err(ServiceError::Validation(
                "This service is not currently available".to_string(),
            ));
        }

        let order = build_order(client, &service, dto, Utc::now());
        let order = self.db_client.insert_order(&order).await?;

        if let Err(e) = self.db_client.increment_total_bookings(service.id).await {
            tracing::warn!("failed to bump bookings for service {}: {}", service.id, e);
        }

        tracing::info!(
            "order {} booked by {} for service {} (total {})",
            order.id,
            client.id,
            service.id,
            order.total_amount
        );

        Ok(order)
    }

    pub async fn get_order_for(&self, user: &User, order_id: Uuid) -> Result<Order, ServiceError> {
        let order = self.load_order(order_id).await?;
        authorize(Actor::User(user), &order)?;
        Ok(order)
    }

    /// Orders a client placed, or orders a provider fulfils.
    pub async fn list_orders(
        &self,
        user: &User,
        query: &OrderQuery,
    ) -> Result<Vec<Order>, ServiceError> {
        let status = query
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()?;

        let orders = self
            .db_client
            .get_user_orders(user.id, user.is_provider(), status, query.limit(), query.offset())
            .await?;

        Ok(orders)
    }

    pub async fn update_details(
        &self,
        user: &User,
        order_id: Uuid,
        dto: UpdateOrderDto,
    ) -> Result<Order, ServiceError> {
        let mut order = self.load_order(order_id).await?;
        authorize(Actor::User(user), &order)?;

        let service = self.load_service(order.service_id).await?;
        dto.apply_to(&mut order);
        order.recompute_total(&service.price);
        order.updated_at = Utc::now();

        Ok(self.db_client.save_order(&order).await?)
    }

    pub async fn update_status(
        &self,
        actor: Actor<'_>,
        order_id: Uuid,
        requested: &str,
    ) -> Result<Order, ServiceError> {
        let mut order = self.load_order(order_id).await?;
        authorize(actor, &order)?;

        let service = self.load_service(order.service_id).await?;
        let transition = transition_order(&mut order, requested, &service.price, Utc::now())?;
        let order = self.db_client.save_order(&order).await?;

        if transition.is_change() {
            tracing::info!(
                "order {} moved {} -> {}",
                order.id,
                transition.old.to_str(),
                transition.new.to_str()
            );
            self.notify_parties(&order, &service, |parties| {
                order_status_notifications(parties, transition)
            })
            .await;
        }

        Ok(order)
    }

    pub async fn delete_order(&self, client: &User, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.load_order(order_id).await?;
        if order.client_id != client.id {
            return Err(ServiceError::Unauthorized(
                "You can only delete your own orders".to_string(),
            ));
        }

        self.db_client.delete_order(order.id).await?;
        Ok(())
    }

    pub(crate) async fn load_order(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.db_client
            .get_order(order_id)
            .await?
            .ok_or(ServiceError::NotFound("Order"))
    }

    pub(crate) async fn load_service(&self, service_id: Uuid) -> Result<Service, ServiceError> {
        self.db_client
            .get_service(service_id)
            .await?
            .ok_or(ServiceError::NotFound("Service"))
    }

    /// Builds notifications against the order's client and provider and stores
    /// them. Nothing here fails the caller: the order is already saved.
    pub(crate) async fn notify_parties<F>(&self, order: &Order, service: &Service, build: F)
    where
        F: FnOnce(&OrderParties<'_>) -> Vec<NewNotification> + Send,
    {
        let users = match self
            .db_client
            .get_users_by_ids(&[order.client_id, order.provider_id])
            .await
        {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!("could not load parties for order {}: {}", order.id, e);
                return;
            }
        };

        let client = users.iter().find(|u| u.id == order.client_id);
        let provider = users.iter().find(|u| u.id == order.provider_id);
        let (Some(client), Some(provider)) = (client, provider) else {
            tracing::warn!("order {} references a missing user, skipping notifications", order.id);
            return;
        };

        let parties = OrderParties {
            order,
            service,
            client,
            provider,
        };
        self.notification_service.dispatch(build(&parties)).await;
    }
}

/// Users may only touch orders they are a party to.
pub fn authorize(actor: Actor<'_>, order: &Order) -> Result<(), ServiceError> {
    match actor.user_id() {
        None => Ok(()),
        Some(user_id) if order.is_participant(user_id) => Ok(()),
        Some(_) => Err(ServiceError::Unauthorized(
            "You do not have access to this order".to_string(),
        )),
    }
}

pub fn build_order(
    client: &User,
    service: &Service,
    dto: CreateOrderDto,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id: Uuid::new_v4(),
        client_id: client.id,
        service_id: service.id,
        provider_id: service.provider_id,
        status: OrderStatus::Pending,
        quantity: dto.quantity,
        total_amount: compute_total(&service.price, dto.quantity),
        scheduled_date: dto.scheduled_date,
        duration_hours: dto.duration_hours,
        is_flexible_timing: dto.is_flexible_timing,
        delivery_address: dto.delivery_address,
        service_location: dto.service_location,
        notes: dto.notes,
        special_requirements: dto.special_requirements,
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

/// Parses `requested` and applies it. An unknown status leaves `order` untouched.
pub fn transition_order(
    order: &mut Order,
    requested: &str,
    unit_price: &sqlx::types::BigDecimal,
    now: DateTime<Utc>,
) -> Result<StatusTransition, ServiceError> {
    let status: OrderStatus = requested.parse()?;
    let transition = order.apply_status(status, now);
    order.recompute_total(unit_price);
    order.updated_at = now;
    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        notificationmodel::NotificationType,
        servicemodel::fixtures::service,
        usermodel::{fixtures::user, AccountType},
    };
    use sqlx::types::BigDecimal;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn booking(service_id: Uuid, quantity: i32) -> CreateOrderDto {
        CreateOrderDto {
            service_id,
            quantity,
            scheduled_date: None,
            duration_hours: 2,
            is_flexible_timing: false,
            delivery_address: None,
            service_location: Some("Westlands".into()),
            notes: None,
            special_requirements: None,
        }
    }

    #[test]
    fn booking_takes_provider_and_total_from_the_service() {
        let client = user("amina", "Amina", "Hassan", AccountType::Client);
        let provider = user("kevo", "Kevin", "Mwangi", AccountType::Provider);
        let plumbing = service(provider.id, "Plumbing", dec("50.00"));

        let order = build_order(&client, &plumbing, booking(plumbing.id, 2), Utc::now());

        assert_eq!(order.provider_id, provider.id);
        assert_eq!(order.client_id, client.id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, dec("100.00"));
    }

    #[test]
    fn invalid_status_leaves_the_order_unchanged() {
        let client = user("amina", "Amina", "Hassan", AccountType::Client);
        let provider = user("kevo", "Kevin", "Mwangi", AccountType::Provider);
        let plumbing = service(provider.id, "Plumbing", dec("50.00"));
        let mut order = build_order(&client, &plumbing, booking(plumbing.id, 1), Utc::now());
        let before = order.updated_at;

        let result = transition_order(&mut order, "shipped", &dec("75.00"), Utc::now());

        assert!(matches!(result, Err(ServiceError::InvalidStatus(_))));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, dec("50.00"));
        assert_eq!(order.updated_at, before);
    }

    #[test]
    fn transition_recomputes_total_from_current_price() {
        let client = user("amina", "Amina", "Hassan", AccountType::Client);
        let provider = user("kevo", "Kevin", "Mwangi", AccountType::Provider);
        let plumbing = service(provider.id, "Plumbing", dec("50.00"));
        let mut order = build_order(&client, &plumbing, booking(plumbing.id, 2), Utc::now());

        let transition =
            transition_order(&mut order, "confirmed", &dec("60.00"), Utc::now()).unwrap();

        assert_eq!(transition.old, OrderStatus::Pending);
        assert_eq!(transition.new, OrderStatus::Confirmed);
        assert_eq!(order.total_amount, dec("120.00"));
        assert!(order.confirmed_at.is_some());
    }

    #[test]
    fn only_participants_or_the_system_may_act() {
        let client = user("amina", "Amina", "Hassan", AccountType::Client);
        let provider = user("kevo", "Kevin", "Mwangi", AccountType::Provider);
        let stranger = user("wafula", "Peter", "Wafula", AccountType::Client);
        let plumbing = service(provider.id, "Plumbing", dec("50.00"));
        let order = build_order(&client, &plumbing, booking(plumbing.id, 1), Utc::now());

        assert!(authorize(Actor::User(&client), &order).is_ok());
        assert!(authorize(Actor::User(&provider), &order).is_ok());
        assert!(authorize(Actor::System, &order).is_ok());
        assert!(matches!(
            authorize(Actor::User(&stranger), &order),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn booking_then_confirm_then_complete() {
        let client = user("amina", "Amina", "Hassan", AccountType::Client);
        let provider = user("kevo", "Kevin", "Mwangi", AccountType::Provider);
        let plumbing = service(provider.id, "Plumbing", dec("50.00"));
        let mut order = build_order(&client, &plumbing, booking(plumbing.id, 2), Utc::now());
        assert_eq!(order.total_amount, dec("100.00"));

        let confirm =
            transition_order(&mut order, "confirmed", &plumbing.price, Utc::now()).unwrap();
        let parties = OrderParties {
            order: &order,
            service: &plumbing,
            client: &client,
            provider: &provider,
        };
        let sent = order_status_notifications(&parties, confirm);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_id, client.id);
        assert_eq!(sent[0].notification_type, NotificationType::OrderConfirmed);

        let repeat =
            transition_order(&mut order, "confirmed", &plumbing.price, Utc::now()).unwrap();
        let parties = OrderParties {
            order: &order,
            service: &plumbing,
            client: &client,
            provider: &provider,
        };
        assert!(order_status_notifications(&parties, repeat).is_empty());

        let complete =
            transition_order(&mut order, "completed", &plumbing.price, Utc::now()).unwrap();
        let parties = OrderParties {
            order: &order,
            service: &plumbing,
            client: &client,
            provider: &provider,
        };
        let sent = order_status_notifications(&parties, complete);
        let recipients: Vec<Uuid> = sent.iter().map(|n| n.recipient_id).collect();
        assert_eq!(sent.len(), 2);
        assert!(recipients.contains(&client.id));
        assert!(recipients.contains(&provider.id));
        assert!(sent.iter().all(|n| n.title == "Order Completed"));
    }
}
