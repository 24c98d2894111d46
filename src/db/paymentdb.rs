// db/paymentdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{ordermodel::Order, paymentmodel::Payment};

#[async_trait]
pub trait PaymentExt {
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_payment_by_checkout_request(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_payment_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error>;

    /// Inserts a new attempt, dropping a previous failed attempt for the same order.
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, sqlx::Error>;

    async fn save_payment(&self, payment: &Payment) -> Result<Payment, sqlx::Error>;

    /// Persists a payment together with the order it cascaded into.
    async fn save_payment_with_order(
        &self,
        payment: &Payment,
        order: &Order,
    ) -> Result<Payment, sqlx::Error>;

    async fn get_payment_history(
        &self,
        user_id: Uuid,
        as_provider: bool,
    ) -> Result<Vec<Payment>, sqlx::Error>;
}

const UPDATE_PAYMENT: &str = r#"
    UPDATE payments
    SET status = $2,
        transaction_id = $3,
        card_brand = $4,
        card_last4 = $5,
        error_message = $6,
        refund_amount = $7,
        refund_transaction_id = $8,
        metadata = $9,
        updated_at = NOW()
    WHERE id = $1
    RETURNING id, order_id, amount, payment_method, phone_number, merchant_request_id,
              checkout_request_id, stripe_payment_intent_id, card_last4, card_brand,
              transaction_id, status, error_message, refund_amount, refund_transaction_id,
              metadata, created_at, updated_at
"#;

#[async_trait]
impl PaymentExt for DBClient {
    async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, amount, payment_method, phone_number, merchant_request_id,
                   checkout_request_id, stripe_payment_intent_id, card_last4, card_brand,
                   transaction_id, status, error_message, refund_amount, refund_transaction_id,
                   metadata, created_at, updated_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment_for_order(&self, order_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, amount, payment_method, phone_number, merchant_request_id,
                   checkout_request_id, stripe_payment_intent_id, card_last4, card_brand,
                   transaction_id, status, error_message, refund_amount, refund_transaction_id,
                   metadata, created_at, updated_at
            FROM payments
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment_by_checkout_request(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, amount, payment_method, phone_number, merchant_request_id,
                   checkout_request_id, stripe_payment_intent_id, card_last4, card_brand,
                   transaction_id, status, error_message, refund_amount, refund_transaction_id,
                   metadata, created_at, updated_at
            FROM payments
            WHERE checkout_request_id = $1
            "#,
        )
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, amount, payment_method, phone_number, merchant_request_id,
                   checkout_request_id, stripe_payment_intent_id, card_last4, card_brand,
                   transaction_id, status, error_message, refund_amount, refund_transaction_id,
                   metadata, created_at, updated_at
            FROM payments
            WHERE stripe_payment_intent_id = $1
            "#,
        )
        .bind(payment_intent_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM payments WHERE order_id = $1 AND status = 'failed'::payment_status",
        )
        .bind(payment.order_id)
        .execute(&mut *tx)
        .await?;

        let saved = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id, order_id, amount, payment_method, phone_number, merchant_request_id,
                checkout_request_id, stripe_payment_intent_id, status, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, order_id, amount, payment_method, phone_number, merchant_request_id,
                      checkout_request_id, stripe_payment_intent_id, card_last4, card_brand,
                      transaction_id, status, error_message, refund_amount, refund_transaction_id,
                      metadata, created_at, updated_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(&payment.amount)
        .bind(payment.payment_method)
        .bind(&payment.phone_number)
        .bind(&payment.merchant_request_id)
        .bind(&payment.checkout_request_id)
        .bind(&payment.stripe_payment_intent_id)
        .bind(payment.status)
        .bind(&payment.metadata)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(saved)
    }

    async fn save_payment(&self, payment: &Payment) -> Result<Payment, sqlx::Error> {
        sqlx::query_as::<_, Payment>(UPDATE_PAYMENT)
            .bind(payment.id)
            .bind(payment.status)
            .bind(&payment.transaction_id)
            .bind(&payment.card_brand)
            .bind(&payment.card_last4)
            .bind(&payment.error_message)
            .bind(&payment.refund_amount)
            .bind(&payment.refund_transaction_id)
            .bind(&payment.metadata)
            .fetch_one(&self.pool)
            .await
    }

    async fn save_payment_with_order(
        &self,
        payment: &Payment,
        order: &Order,
    ) -> Result<Payment, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, Payment>(UPDATE_PAYMENT)
            .bind(payment.id)
            .bind(payment.status)
            .bind(&payment.transaction_id)
            .bind(&payment.card_brand)
            .bind(&payment.card_last4)
            .bind(&payment.error_message)
            .bind(&payment.refund_amount)
            .bind(&payment.refund_transaction_id)
            .bind(&payment.metadata)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2,
                confirmed_at = $3,
                started_at = $4,
                completed_at = $5,
                total_amount = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.status)
        .bind(order.confirmed_at)
        .bind(order.started_at)
        .bind(order.completed_at)
        .bind(&order.total_amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(saved)
    }

    async fn get_payment_history(
        &self,
        user_id: Uuid,
        as_provider: bool,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.id, p.order_id, p.amount, p.payment_method, p.phone_number,
                   p.merchant_request_id, p.checkout_request_id, p.stripe_payment_intent_id,
                   p.card_last4, p.card_brand, p.transaction_id, p.status, p.error_message,
                   p.refund_amount, p.refund_transaction_id, p.metadata, p.created_at,
                   p.updated_at
            FROM payments p
            JOIN orders o ON o.id = p.order_id
            WHERE (CASE WHEN $2 THEN o.provider_id ELSE o.client_id END) = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(as_provider)
        .fetch_all(&self.pool)
        .await
    }
}
