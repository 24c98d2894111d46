use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use super::validate_positive_amount;
use crate::models::paymentmodel::{Payment, PaymentMethod};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentDto {
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    #[validate(length(min = 9, max = 15, message = "Phone number is invalid"))]
    pub phone_number: Option<String>,
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundDto {
    #[validate(custom = "validate_positive_amount")]
    pub amount: Option<BigDecimal>,
}

/// What the client needs to continue a payment it just started.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "payment_method", rename_all = "snake_case")]
pub enum PaymentInitiation {
    Mpesa {
        payment: Payment,
        checkout_request_id: String,
        customer_message: Option<String>,
    },
    Card {
        payment: Payment,
        client_secret: Option<String>,
        publishable_key: String,
    },
}

impl PaymentInitiation {
    pub fn payment(&self) -> &Payment {
        match self {
            PaymentInitiation::Mpesa { payment, .. } | PaymentInitiation::Card { payment, .. } => {
                payment
            }
        }
    }
}
