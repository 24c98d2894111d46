// db/orderdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ordermodel::{Order, OrderStats, OrderStatus};

#[async_trait]
pub trait OrderExt {
    async fn insert_order(&self, order: &Order) -> Result<Order, sqlx::Error>;

    /// Writes every mutable column of `order` back.
    async fn save_order(&self, order: &Order) -> Result<Order, sqlx::Error>;

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error>;

    async fn get_user_orders(
        &self,
        user_id: Uuid,
        as_provider: bool,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error>;

    async fn get_order_stats(
        &self,
        user_id: Uuid,
        as_provider: bool,
    ) -> Result<OrderStats, sqlx::Error>;

    async fn delete_order(&self, order_id: Uuid) -> Result<(), sqlx::Error>;

    /// The client's earliest order for a service, if any.
    async fn get_first_order_id(
        &self,
        client_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error>;

    async fn get_orders_due_for_reminder(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Order>, sqlx::Error>;

    async fn mark_reminder_sent(
        &self,
        order_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl OrderExt for DBClient {
    async fn insert_order(&self, order: &Order) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, client_id, service_id, provider_id, status, quantity, total_amount,
                scheduled_date, duration_hours, is_flexible_timing, delivery_address,
                service_location, notes, special_requirements, provider_notes,
                estimated_completion, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17)
            RETURNING id, client_id, service_id, provider_id, status, quantity, total_amount,
                      scheduled_date, duration_hours, is_flexible_timing, delivery_address,
                      service_location, notes, special_requirements, provider_notes,
                      estimated_completion, created_at, updated_at, confirmed_at,
                      started_at, completed_at, reminder_sent_at
            "#,
        )
        .bind(order.id)
        .bind(order.client_id)
        .bind(order.service_id)
        .bind(order.provider_id)
        .bind(order.status)
        .bind(order.quantity)
        .bind(&order.total_amount)
        .bind(order.scheduled_date)
        .bind(order.duration_hours)
        .bind(order.is_flexible_timing)
        .bind(&order.delivery_address)
        .bind(&order.service_location)
        .bind(&order.notes)
        .bind(&order.special_requirements)
        .bind(&order.provider_notes)
        .bind(order.estimated_completion)
        .bind(order.created_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_order(&self, order: &Order) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2,
                quantity = $3,
                total_amount = $4,
                scheduled_date = $5,
                duration_hours = $6,
                is_flexible_timing = $7,
                delivery_address = $8,
                service_location = $9,
                notes = $10,
                special_requirements = $11,
                provider_notes = $12,
                estimated_completion = $13,
                confirmed_at = $14,
                started_at = $15,
                completed_at = $16,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, client_id, service_id, provider_id, status, quantity, total_amount,
                      scheduled_date, duration_hours, is_flexible_timing, delivery_address,
                      service_location, notes, special_requirements, provider_notes,
                      estimated_completion, created_at, updated_at, confirmed_at,
                      started_at, completed_at, reminder_sent_at
            "#,
        )
        .bind(order.id)
        .bind(order.status)
        .bind(order.quantity)
        .bind(&order.total_amount)
        .bind(order.scheduled_date)
        .bind(order.duration_hours)
        .bind(order.is_flexible_timing)
        .bind(&order.delivery_address)
        .bind(&order.service_location)
        .bind(&order.notes)
        .bind(&order.special_requirements)
        .bind(&order.provider_notes)
        .bind(order.estimated_completion)
        .bind(order.confirmed_at)
        .bind(order.started_at)
        .bind(order.completed_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, client_id, service_id, provider_id, status, quantity, total_amount,
                   scheduled_date, duration_hours, is_flexible_timing, delivery_address,
                   service_location, notes, special_requirements, provider_notes,
                   estimated_completion, created_at, updated_at, confirmed_at,
                   started_at, completed_at, reminder_sent_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_orders(
        &self,
        user_id: Uuid,
        as_provider: bool,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, client_id, service_id, provider_id, status, quantity, total_amount,
                   scheduled_date, duration_hours, is_flexible_timing, delivery_address,
                   service_location, notes, special_requirements, provider_notes,
                   estimated_completion, created_at, updated_at, confirmed_at,
                   started_at, completed_at, reminder_sent_at
            FROM orders
            WHERE (CASE WHEN $2 THEN provider_id ELSE client_id END) = $1
              AND ($3::order_status IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(as_provider)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_order_stats(
        &self,
        user_id: Uuid,
        as_provider: bool,
    ) -> Result<OrderStats, sqlx::Error> {
        sqlx::query_as::<_, OrderStats>(
            r#"
            SELECT COUNT(*) AS total_orders,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending_orders,
                   COUNT(*) FILTER (WHERE status IN ('confirmed', 'in_progress')) AS active_orders,
                   COUNT(*) FILTER (WHERE status = 'completed') AS completed_orders,
                   COALESCE(SUM(total_amount) FILTER (WHERE status = 'completed'), 0) AS total_amount
            FROM orders
            WHERE (CASE WHEN $2 THEN provider_id ELSE client_id END) = $1
            "#,
        )
        .bind(user_id)
        .bind(as_provider)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_first_order_id(
        &self,
        client_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT id FROM orders
            WHERE client_id = $1 AND service_id = $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(client_id)
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_orders_due_for_reminder(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT id, client_id, service_id, provider_id, status, quantity, total_amount,
                   scheduled_date, duration_hours, is_flexible_timing, delivery_address,
                   service_location, notes, special_requirements, provider_notes,
                   estimated_completion, created_at, updated_at, confirmed_at,
                   started_at, completed_at, reminder_sent_at
            FROM orders
            WHERE scheduled_date >= $1 AND scheduled_date < $2
              AND status IN ('pending', 'confirmed')
              AND reminder_sent_at IS NULL
            "#,
        )
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_reminder_sent(
        &self,
        order_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET reminder_sent_at = $2 WHERE id = $1")
            .bind(order_id)
            .bind(sent_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
