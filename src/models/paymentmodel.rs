// models/paymentmodel.rs
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
        }
    }

    /// States a gateway callback may still move.
    pub fn accepts_gateway_result(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Pending | PaymentStatus::Processing | PaymentStatus::Failed
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Mpesa,
    Card,
    Bank,
    Cash,
}

impl PaymentMethod {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentMethod::Mpesa => "mpesa",
            PaymentMethod::Card => "card",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Cash => "cash",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub payment_method: PaymentMethod,
    pub phone_number: Option<String>,
    pub merchant_request_id: Option<String>,
    pub checkout_request_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub error_message: Option<String>,
    pub refund_amount: BigDecimal,
    pub refund_transaction_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal result reported by a gateway for one payment.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResult {
    Succeeded {
        transaction_id: Option<String>,
        card_brand: Option<String>,
        card_last4: Option<String>,
        metadata: Option<serde_json::Value>,
    },
    Failed {
        error_message: Option<String>,
    },
}

impl GatewayResult {
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            GatewayResult::Succeeded { .. } => PaymentStatus::Completed,
            GatewayResult::Failed { .. } => PaymentStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayApplication {
    Updated { old: PaymentStatus, new: PaymentStatus },
    /// The payment already holds this result; replayed callbacks land here.
    AlreadyApplied,
    /// The payment has settled (completed, refunded, cancelled) and ignores further results.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundRejection {
    NotCompleted(PaymentStatus),
    NonPositiveAmount,
    ExceedsPayment,
}

impl std::fmt::Display for RefundRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundRejection::NotCompleted(_) => {
                write!(f, "Only completed payments can be refunded")
            }
            RefundRejection::NonPositiveAmount => {
                write!(f, "Refund amount must be greater than zero")
            }
            RefundRejection::ExceedsPayment => {
                write!(f, "Refund amount cannot exceed the amount paid")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundPlan {
    pub amount: BigDecimal,
    pub resulting_status: PaymentStatus,
    pub is_full: bool,
}

impl RefundPlan {
    pub fn for_payment(
        payment: &Payment,
        requested: Option<BigDecimal>,
    ) -> Result<Self, RefundRejection> {
        if payment.status != PaymentStatus::Completed {
            return Err(RefundRejection::NotCompleted(payment.status));
        }

        let amount = requested.unwrap_or_else(|| payment.amount.clone());
        if amount <= BigDecimal::zero() {
            return Err(RefundRejection::NonPositiveAmount);
        }
        if amount > payment.amount {
            return Err(RefundRejection::ExceedsPayment);
        }

        let is_full = amount >= payment.amount;
        Ok(RefundPlan {
            amount,
            resulting_status: if is_full {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::PartiallyRefunded
            },
            is_full,
        })
    }
}

impl Payment {
    pub fn can_refund(&self) -> bool {
        self.status == PaymentStatus::Completed && self.refund_amount.is_zero()
    }

    /// A failed payment frees its order for a new attempt.
    pub fn blocks_new_attempt(&self) -> bool {
        self.status != PaymentStatus::Failed
    }

    pub fn apply_gateway_result(&mut self, result: GatewayResult) -> GatewayApplication {
        let target = result.target_status();
        if self.status == target {
            return GatewayApplication::AlreadyApplied;
        }
        if !self.status.accepts_gateway_result() {
            return GatewayApplication::Ignored;
        }

        let old = self.status;
        self.status = target;
        match result {
            GatewayResult::Succeeded {
                transaction_id,
                card_brand,
                card_last4,
                metadata,
            } => {
                self.transaction_id = transaction_id.or(self.transaction_id.take());
                self.card_brand = card_brand.or(self.card_brand.take());
                self.card_last4 = card_last4.or(self.card_last4.take());
                if metadata.is_some() {
                    self.metadata = metadata;
                }
                self.error_message = None;
            }
            GatewayResult::Failed { error_message } => {
                self.error_message = error_message;
            }
        }

        GatewayApplication::Updated { old, new: target }
    }

    pub fn apply_refund(&mut self, plan: &RefundPlan, refund_transaction_id: Option<String>) {
        self.refund_amount = plan.amount.clone();
        self.refund_transaction_id = refund_transaction_id;
        self.status = plan.resulting_status;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn payment(order_id: Uuid, amount: BigDecimal, method: PaymentMethod) -> Payment {
        let now = Utc::now();
        Payment {
            id: Uuid::new_v4(),
            order_id,
            amount,
            payment_method: method,
            phone_number: None,
            merchant_request_id: None,
            checkout_request_id: None,
            stripe_payment_intent_id: None,
            card_last4: None,
            card_brand: None,
            transaction_id: None,
            status: PaymentStatus::Pending,
            error_message: None,
            refund_amount: BigDecimal::zero(),
            refund_transaction_id: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn completed_payment(amount: &str) -> Payment {
        let mut payment = fixtures::payment(Uuid::new_v4(), dec(amount), PaymentMethod::Card);
        payment.status = PaymentStatus::Completed;
        payment
    }

    fn success(tx: &str) -> GatewayResult {
        GatewayResult::Succeeded {
            transaction_id: Some(tx.to_string()),
            card_brand: None,
            card_last4: None,
            metadata: None,
        }
    }

    #[test]
    fn success_completes_a_pending_payment() {
        let mut payment = fixtures::payment(Uuid::new_v4(), dec("100.00"), PaymentMethod::Mpesa);
        let applied = payment.apply_gateway_result(success("QK12ABC"));

        assert_eq!(
            applied,
            GatewayApplication::Updated {
                old: PaymentStatus::Pending,
                new: PaymentStatus::Completed
            }
        );
        assert_eq!(payment.transaction_id.as_deref(), Some("QK12ABC"));
    }

    #[test]
    fn replayed_result_is_a_no_op() {
        let mut payment = fixtures::payment(Uuid::new_v4(), dec("100.00"), PaymentMethod::Mpesa);
        payment.apply_gateway_result(success("QK12ABC"));

        let replay = payment.apply_gateway_result(success("QK12ABC"));
        assert_eq!(replay, GatewayApplication::AlreadyApplied);
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn failure_records_the_gateway_message() {
        let mut payment = fixtures::payment(Uuid::new_v4(), dec("10.00"), PaymentMethod::Card);
        payment.status = PaymentStatus::Processing;

        payment.apply_gateway_result(GatewayResult::Failed {
            error_message: Some("Your card was declined.".into()),
        });
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.error_message.as_deref(), Some("Your card was declined."));
    }

    #[test]
    fn settled_payments_ignore_late_failures() {
        let mut payment = completed_payment("10.00");
        let applied = payment.apply_gateway_result(GatewayResult::Failed { error_message: None });
        assert_eq!(applied, GatewayApplication::Ignored);
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn full_refund_by_default() {
        let payment = completed_payment("100.00");
        let plan = RefundPlan::for_payment(&payment, None).unwrap();
        assert_eq!(plan.amount, dec("100.00"));
        assert_eq!(plan.resulting_status, PaymentStatus::Refunded);
        assert!(plan.is_full);
    }

    #[test]
    fn partial_refund() {
        let mut payment = completed_payment("100.00");
        let plan = RefundPlan::for_payment(&payment, Some(dec("40.00"))).unwrap();
        assert_eq!(plan.resulting_status, PaymentStatus::PartiallyRefunded);
        assert!(!plan.is_full);

        payment.apply_refund(&plan, Some("re_123".into()));
        assert_eq!(payment.refund_amount, dec("40.00"));
        assert_eq!(payment.status, PaymentStatus::PartiallyRefunded);
        assert!(!payment.can_refund());
    }

    #[test]
    fn refund_requires_completed_payment_and_sane_amount() {
        let mut pending = completed_payment("100.00");
        pending.status = PaymentStatus::Pending;
        assert_eq!(
            RefundPlan::for_payment(&pending, None),
            Err(RefundRejection::NotCompleted(PaymentStatus::Pending))
        );

        let payment = completed_payment("100.00");
        assert_eq!(
            RefundPlan::for_payment(&payment, Some(dec("0"))),
            Err(RefundRejection::NonPositiveAmount)
        );
        assert_eq!(
            RefundPlan::for_payment(&payment, Some(dec("100.01"))),
            Err(RefundRejection::ExceedsPayment)
        );
    }

    #[test]
    fn only_failed_payments_free_the_order() {
        let mut payment = fixtures::payment(Uuid::new_v4(), dec("1.00"), PaymentMethod::Mpesa);
        assert!(payment.blocks_new_attempt());
        payment.status = PaymentStatus::Failed;
        assert!(!payment.blocks_new_attempt());
    }
}
