// service/payment_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use num_traits::Zero;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, paymentdb::PaymentExt},
    dtos::paymentdtos::{CreatePaymentDto, PaymentInitiation},
    models::{
        notificationmodel::NewNotification,
        ordermodel::{Order, OrderStatus, StatusTransition},
        paymentmodel::{
            GatewayApplication, GatewayResult, Payment, PaymentMethod, PaymentStatus, RefundPlan,
        },
        usermodel::User,
    },
    service::{
        error::{GatewayError, ServiceError},
        mpesa::{MobileMoneyGateway, StkCallback, StkPushRequest, StkPushResponse},
        notification_service::{
            order_status_notifications, payment_status_notifications, OrderParties,
        },
        order_service::OrderService,
        stripe::{
            verify_webhook_signature, CardGateway, PaymentIntentRequest, RefundRequest,
            WebhookEvent,
        },
    },
    utils::currency::{to_minor_units, to_whole_units},
};

#[derive(Clone)]
pub struct PaymentService {
    db_client: Arc<DBClient>,
    order_service: Arc<OrderService>,
    mobile_money: Arc<dyn MobileMoneyGateway>,
    card: Arc<dyn CardGateway>,
    callback_url: String,
    currency: String,
    webhook_secret: String,
}

impl std::fmt::Debug for PaymentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentService")
            .field("callback_url", &self.callback_url)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl PaymentService {
    pub fn new(
        db_client: Arc<DBClient>,
        order_service: Arc<OrderService>,
        mobile_money: Arc<dyn MobileMoneyGateway>,
        card: Arc<dyn CardGateway>,
        callback_url: String,
        currency: String,
        webhook_secret: String,
    ) -> Self {
        Self {
            db_client,
            order_service,
            mobile_money,
            card,
            callback_url,
            currency,
            webhook_secret,
        }
    }

    pub async fn initiate(
        &self,
        client: &User,
        dto: CreatePaymentDto,
    ) -> Result<PaymentInitiation, ServiceError> {
        let order = self.order_service.load_order(dto.order_id).await?;
        if order.client_id != client.id {
            return Err(ServiceError::Unauthorized(
                "You can only pay for your own orders".to_string(),
            ));
        }

        if let Some(existing) = self.db_client.get_payment_for_order(order.id).await? {
            if existing.blocks_new_attempt() {
                return Err(ServiceError::Conflict(format!(
                    "Order already has a {} payment",
                    existing.status.to_str()
                )));
            }
        }

        match dto.payment_method {
            PaymentMethod::Mpesa => {
                let phone = dto
                    .phone_number
                    .filter(|p| !p.trim().is_empty())
                    .ok_or_else(|| {
                        ServiceError::Validation(
                            "Phone number is required for M-Pesa payments".to_string(),
                        )
                    })?;

                let request = stk_request(&order, &phone, &self.callback_url)?;
                let response = push_stk(self.mobile_money.as_ref(), request).await?;

                let mut payment = new_payment(&order, PaymentMethod::Mpesa, Utc::now());
                payment.phone_number = Some(phone);
                payment.merchant_request_id = Some(response.merchant_request_id.clone());
                payment.checkout_request_id = Some(response.checkout_request_id.clone());
                let payment = self.db_client.insert_payment(&payment).await?;

                tracing::info!(
                    "STK push sent for order {} (checkout {})",
                    order.id,
                    response.checkout_request_id
                );

                Ok(PaymentInitiation::Mpesa {
                    payment,
                    checkout_request_id: response.checkout_request_id,
                    customer_message: response.customer_message,
                })
            }
            PaymentMethod::Card => {
                let request = intent_request(&order, &self.currency)?;
                let intent = self.card.create_payment_intent(request).await.map_err(|e| {
                    tracing::error!("payment intent for order {} failed: {}", order.id, e);
                    e
                })?;

                let mut payment = new_payment(&order, PaymentMethod::Card, Utc::now());
                payment.stripe_payment_intent_id = Some(intent.id.clone());
                payment.status = PaymentStatus::Processing;
                let payment = self.db_client.insert_payment(&payment).await?;

                tracing::info!("payment intent {} created for order {}", intent.id, order.id);

                Ok(PaymentInitiation::Card {
                    payment,
                    client_secret: intent.client_secret,
                    publishable_key: self.card.publishable_key().to_string(),
                })
            }
            PaymentMethod::Bank | PaymentMethod::Cash => Err(ServiceError::Validation(format!(
                "{} payments cannot be started online",
                dto.payment_method.to_str()
            ))),
        }
    }

    /// Applies a Daraja STK callback. Unknown checkout ids are ignored.
    pub async fn handle_mpesa_callback(
        &self,
        callback: &StkCallback,
    ) -> Result<Option<Payment>, ServiceError> {
        let Some(payment) = self
            .db_client
            .get_payment_by_checkout_request(&callback.checkout_request_id)
            .await?
        else {
            tracing::warn!(
                "M-Pesa callback for unknown checkout {}",
                callback.checkout_request_id
            );
            return Ok(None);
        };

        if callback.is_success() && callback.transaction_id().is_none() {
            tracing::warn!(
                "M-Pesa callback for checkout {} carried no receipt number",
                callback.checkout_request_id
            );
        }

        self.apply_gateway_result(payment, callback.to_gateway_result())
            .await
            .map(Some)
    }

    /// Verifies the `Stripe-Signature` header against the raw body, then parses it.
    pub fn verify_stripe_event(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, ServiceError> {
        let signature = signature.ok_or(ServiceError::InvalidSignature)?;
        verify_webhook_signature(payload, signature, &self.webhook_secret, Utc::now().timestamp())
            .map_err(|e| {
                tracing::warn!("rejected Stripe webhook: {:?}", e);
                ServiceError::InvalidSignature
            })?;

        serde_json::from_slice(payload)
            .map_err(|e| ServiceError::Validation(format!("Invalid webhook payload: {}", e)))
    }

    pub async fn handle_stripe_event(
        &self,
        event: &WebhookEvent,
    ) -> Result<Option<Payment>, ServiceError> {
        let Some((intent_id, result)) = event.payment_intent_result() else {
            tracing::debug!("ignoring Stripe event {} ({})", event.id, event.event_type);
            return Ok(None);
        };

        let Some(payment) = self.db_client.get_payment_by_intent(&intent_id).await? else {
            tracing::warn!("Stripe event {} for unknown intent {}", event.id, intent_id);
            return Ok(None);
        };

        self.apply_gateway_result(payment, result).await.map(Some)
    }

    async fn apply_gateway_result(
        &self,
        mut payment: Payment,
        result: GatewayResult,
    ) -> Result<Payment, ServiceError> {
        let mut order = self.order_service.load_order(payment.order_id).await?;
        let service = self.order_service.load_service(order.service_id).await?;

        let settlement = settle(&mut payment, &mut order, &service.price, result, Utc::now());
        let payment = match settlement {
            Settlement::Replayed => {
                tracing::info!(
                    "payment {} already {}, replay ignored",
                    payment.id,
                    payment.status.to_str()
                );
                return Ok(payment);
            }
            Settlement::Ignored => {
                tracing::warn!(
                    "payment {} is {}, late gateway result ignored",
                    payment.id,
                    payment.status.to_str()
                );
                return Ok(payment);
            }
            Settlement::Completed { .. } => {
                let payment = self.db_client.save_payment_with_order(&payment, &order).await?;
                tracing::info!("payment {} completed, order {} confirmed", payment.id, order.id);
                payment
            }
            Settlement::Failed { .. } => {
                let payment = self.db_client.save_payment(&payment).await?;
                tracing::info!(
                    "payment {} for order {} failed: {}",
                    payment.id,
                    order.id,
                    payment.error_message.as_deref().unwrap_or("no reason given")
                );
                payment
            }
        };

        self.order_service
            .notify_parties(&order, &service, |parties| {
                settlement.notifications(parties, &payment)
            })
            .await;
        Ok(payment)
    }

    pub async fn refund(
        &self,
        provider: &User,
        payment_id: Uuid,
        amount: Option<BigDecimal>,
    ) -> Result<Payment, ServiceError> {
        let mut payment = self.load_payment(payment_id).await?;
        let mut order = self.order_service.load_order(payment.order_id).await?;
        if order.provider_id != provider.id {
            return Err(ServiceError::Unauthorized(
                "Only the order's provider can issue refunds".to_string(),
            ));
        }

        let plan = RefundPlan::for_payment(&payment, amount)
            .map_err(|rejection| ServiceError::Validation(rejection.to_string()))?;

        let refund_id = match payment.payment_method {
            PaymentMethod::Card => {
                let intent_id = payment.stripe_payment_intent_id.clone().ok_or_else(|| {
                    ServiceError::Validation("Payment has no card charge to refund".to_string())
                })?;
                let amount = minor_units(&plan.amount)?;
                let refund = self
                    .card
                    .create_refund(RefundRequest {
                        payment_intent_id: intent_id,
                        amount,
                    })
                    .await?;
                Some(refund.id)
            }
            // Daraja reversals are handled outside the platform.
            _ => None,
        };

        let service = self.order_service.load_service(order.service_id).await?;
        let order_transition = apply_refund(
            &mut payment,
            &mut order,
            &plan,
            refund_id,
            &service.price,
            Utc::now(),
        );

        let payment = match order_transition {
            Some(_) => self.db_client.save_payment_with_order(&payment, &order).await?,
            None => self.db_client.save_payment(&payment).await?,
        };

        tracing::info!(
            "refunded {} of payment {} ({})",
            plan.amount,
            payment.id,
            payment.status.to_str()
        );
        Ok(payment)
    }

    pub async fn history(&self, user: &User) -> Result<Vec<Payment>, ServiceError> {
        Ok(self
            .db_client
            .get_payment_history(user.id, user.is_provider())
            .await?)
    }

    pub async fn detail(&self, user: &User, payment_id: Uuid) -> Result<Payment, ServiceError> {
        let payment = self.load_payment(payment_id).await?;
        let order = self.order_service.load_order(payment.order_id).await?;
        if !order.is_participant(user.id) {
            return Err(ServiceError::Unauthorized(
                "You do not have access to this payment".to_string(),
            ));
        }
        Ok(payment)
    }

    async fn load_payment(&self, payment_id: Uuid) -> Result<Payment, ServiceError> {
        self.db_client
            .get_payment(payment_id)
            .await?
            .ok_or(ServiceError::NotFound("Payment"))
    }
}

/// What one gateway result did to a payment and its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The payment already carried this result.
    Replayed,
    /// The payment had settled before the result arrived.
    Ignored,
    Completed {
        old: PaymentStatus,
        order: StatusTransition,
    },
    Failed {
        old: PaymentStatus,
    },
}

impl Settlement {
    pub fn notifications(
        &self,
        parties: &OrderParties<'_>,
        payment: &Payment,
    ) -> Vec<NewNotification> {
        match *self {
            Settlement::Replayed | Settlement::Ignored => Vec::new(),
            Settlement::Completed { old, order } => {
                let mut notifications = order_status_notifications(parties, order);
                notifications.extend(payment_status_notifications(
                    parties,
                    payment,
                    old,
                    PaymentStatus::Completed,
                ));
                notifications
            }
            Settlement::Failed { old } => {
                payment_status_notifications(parties, payment, old, PaymentStatus::Failed)
            }
        }
    }
}

/// Applies a gateway result. A completed payment confirms its order and
/// reprices it from `unit_price`; a failure leaves the order alone.
pub fn settle(
    payment: &mut Payment,
    order: &mut Order,
    unit_price: &BigDecimal,
    result: GatewayResult,
    now: DateTime<Utc>,
) -> Settlement {
    match payment.apply_gateway_result(result) {
        GatewayApplication::AlreadyApplied => Settlement::Replayed,
        GatewayApplication::Ignored => Settlement::Ignored,
        GatewayApplication::Updated { old, new } => {
            payment.updated_at = now;
            if new == PaymentStatus::Completed {
                let transition = order.apply_status(OrderStatus::Confirmed, now);
                order.recompute_total(unit_price);
                order.updated_at = now;
                Settlement::Completed {
                    old,
                    order: transition,
                }
            } else {
                Settlement::Failed { old }
            }
        }
    }
}

/// Records `plan` on the payment. Only a full refund moves the order, and
/// the returned transition says whether it did.
pub fn apply_refund(
    payment: &mut Payment,
    order: &mut Order,
    plan: &RefundPlan,
    refund_transaction_id: Option<String>,
    unit_price: &BigDecimal,
    now: DateTime<Utc>,
) -> Option<StatusTransition> {
    payment.apply_refund(plan, refund_transaction_id);
    payment.updated_at = now;

    if !plan.is_full {
        return None;
    }

    let transition = order.apply_status(OrderStatus::Refunded, now);
    order.recompute_total(unit_price);
    order.updated_at = now;
    Some(transition)
}

pub fn new_payment(order: &Order, method: PaymentMethod, now: DateTime<Utc>) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        order_id: order.id,
        amount: order.total_amount.clone(),
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

pub fn stk_request(
    order: &Order,
    phone_number: &str,
    callback_url: &str,
) -> Result<StkPushRequest, ServiceError> {
    let amount = to_whole_units(&order.total_amount)
        .ok_or_else(|| ServiceError::Validation("Order amount is out of range".to_string()))?;

    Ok(StkPushRequest {
        amount,
        phone_number: phone_number.trim_start_matches('+').to_string(),
        callback_url: callback_url.to_string(),
        account_reference: format!("Order#{}", order.id),
        transaction_desc: format!("Payment for Order#{}", order.id),
    })
}

pub fn intent_request(order: &Order, currency: &str) -> Result<PaymentIntentRequest, ServiceError> {
    Ok(PaymentIntentRequest {
        amount: minor_units(&order.total_amount)?,
        currency: currency.to_lowercase(),
        order_id: order.id,
    })
}

fn minor_units(amount: &BigDecimal) -> Result<i64, ServiceError> {
    to_minor_units(amount)
        .ok_or_else(|| ServiceError::Validation("Amount is out of range".to_string()))
}

/// Sends the push; a response code other than "0" is a rejection.
pub async fn push_stk(
    gateway: &dyn MobileMoneyGateway,
    request: StkPushRequest,
) -> Result<StkPushResponse, ServiceError> {
    let reference = request.account_reference.clone();
    let response = gateway.stk_push(request).await.map_err(|e| {
        tracing::error!("STK push for {} failed: {}", reference, e);
        e
    })?;

    if !response.is_accepted() {
        tracing::warn!(
            "STK push for {} rejected ({}): {}",
            reference,
            response.response_code,
            response.response_description
        );
        return Err(GatewayError::Rejected(response.response_description).into());
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ordermodel::fixtures::order,
        notificationmodel::NotificationType,
        servicemodel::{fixtures::service, Service},
        usermodel::{fixtures::user, AccountType},
    };
    use async_trait::async_trait;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn sample_order(total: &str) -> Order {
        order(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), dec(total))
    }

    #[test]
    fn stk_request_uses_whole_units_and_order_reference() {
        let order = sample_order("1499.99");
        let request = stk_request(
            &order,
            "+254712345678",
            "https://huduma.test/api/v1/payments/mpesa-callback",
        )
        .unwrap();

        assert_eq!(request.amount, 1499);
        assert_eq!(request.phone_number, "254712345678");
        assert_eq!(request.account_reference, format!("Order#{}", order.id));
        assert_eq!(request.transaction_desc, format!("Payment for Order#{}", order.id));
    }

    #[test]
    fn intent_request_uses_minor_units() {
        let order = sample_order("100.00");
        let request = intent_request(&order, "KES").unwrap();
        assert_eq!(request.amount, 10000);
        assert_eq!(request.currency, "kes");
        assert_eq!(request.order_id, order.id);
    }

    #[test]
    fn new_payment_copies_the_order_total() {
        let order = sample_order("250.00");
        let payment = new_payment(&order, PaymentMethod::Mpesa, Utc::now());
        assert_eq!(payment.amount, dec("250.00"));
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.refund_amount.is_zero());
    }

    struct ScriptedDaraja {
        code: &'static str,
    }

    #[async_trait]
    impl MobileMoneyGateway for ScriptedDaraja {
        async fn stk_push(
            &self,
            _request: StkPushRequest,
        ) -> Result<StkPushResponse, GatewayError> {
            Ok(StkPushResponse {
                merchant_request_id: "29115-34620561-1".into(),
                checkout_request_id: "ws_CO_191220191020363925".into(),
                response_code: self.code.into(),
                response_description: if self.code == "0" {
                    "Success. Request accepted for processing".into()
                } else {
                    "Invalid PhoneNumber".into()
                },
                customer_message: None,
            })
        }
    }

    #[tokio::test]
    async fn accepted_push_returns_checkout_ids() {
        let request = stk_request(&sample_order("10.00"), "254712345678", "https://cb").unwrap();
        let response = push_stk(&ScriptedDaraja { code: "0" }, request).await.unwrap();
        assert_eq!(response.checkout_request_id, "ws_CO_191220191020363925");
    }

    #[tokio::test]
    async fn rejected_push_surfaces_the_description() {
        let request = stk_request(&sample_order("10.00"), "254712345678", "https://cb").unwrap();
        let err = push_stk(&ScriptedDaraja { code: "1" }, request)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Gateway(GatewayError::Rejected(_))));
        assert_eq!(err.to_string(), "Invalid PhoneNumber");
    }

    fn completed_callback() -> StkCallback {
        serde_json::from_value(serde_json::json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResultCode": 0,
            "ResultDesc": "The service request is processed successfully.",
            "CallbackMetadata": {
                "Item": [
                    { "Name": "Amount", "Value": 10 },
                    { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                    { "Name": "PhoneNumber", "Value": 254712345678u64 }
                ]
            }
        }))
        .unwrap()
    }

    struct Booking {
        client: User,
        provider: User,
        service: Service,
        order: Order,
    }

    fn booking(price: &str) -> Booking {
        let client = user("amina", "Amina", "Hassan", AccountType::Client);
        let provider = user("kevo", "Kevin", "Mwangi", AccountType::Provider);
        let service = service(provider.id, "Plumbing", dec(price));
        let order = order(client.id, provider.id, service.id, dec(price));
        Booking {
            client,
            provider,
            service,
            order,
        }
    }

    fn parties(b: &Booking) -> OrderParties<'_> {
        OrderParties {
            order: &b.order,
            service: &b.service,
            client: &b.client,
            provider: &b.provider,
        }
    }

    fn paid(b: &Booking) -> Payment {
        let mut payment = new_payment(&b.order, PaymentMethod::Mpesa, Utc::now());
        payment.status = PaymentStatus::Completed;
        payment
    }

    #[test]
    fn successful_callback_completes_payment_and_confirms_order() {
        let mut b = booking("10.00");
        let mut payment = new_payment(&b.order, PaymentMethod::Mpesa, Utc::now());
        let price = b.service.price.clone();

        let settlement = settle(
            &mut payment,
            &mut b.order,
            &price,
            completed_callback().to_gateway_result(),
            Utc::now(),
        );

        assert!(matches!(settlement, Settlement::Completed { .. }));
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.transaction_id.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(b.order.status, OrderStatus::Confirmed);
        assert!(b.order.confirmed_at.is_some());

        let sent = settlement.notifications(&parties(&b), &payment);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].notification_type, NotificationType::OrderConfirmed);
        assert_eq!(sent[0].recipient_id, b.client.id);
        assert_eq!(sent[1].notification_type, NotificationType::PaymentReceived);
        assert_eq!(sent[1].recipient_id, b.provider.id);
    }

    #[test]
    fn replayed_callback_changes_nothing() {
        let mut b = booking("10.00");
        let mut payment = new_payment(&b.order, PaymentMethod::Mpesa, Utc::now());
        let price = b.service.price.clone();
        let callback = completed_callback();

        settle(&mut payment, &mut b.order, &price, callback.to_gateway_result(), Utc::now());
        let confirmed_at = b.order.confirmed_at;
        let updated_at = payment.updated_at;

        let replay = settle(
            &mut payment,
            &mut b.order,
            &price,
            callback.to_gateway_result(),
            Utc::now(),
        );

        assert_eq!(replay, Settlement::Replayed);
        assert_eq!(payment.updated_at, updated_at);
        assert_eq!(b.order.confirmed_at, confirmed_at);
        assert!(replay.notifications(&parties(&b), &payment).is_empty());
    }

    #[test]
    fn failed_callback_leaves_the_order_pending() {
        let mut b = booking("10.00");
        let mut payment = new_payment(&b.order, PaymentMethod::Mpesa, Utc::now());
        let price = b.service.price.clone();
        let callback: StkCallback = serde_json::from_value(serde_json::json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResultCode": 1032,
            "ResultDesc": "Request cancelled by user"
        }))
        .unwrap();

        let settlement = settle(
            &mut payment,
            &mut b.order,
            &price,
            callback.to_gateway_result(),
            Utc::now(),
        );

        assert_eq!(
            settlement,
            Settlement::Failed {
                old: PaymentStatus::Pending
            }
        );
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.error_message.as_deref(), Some("Request cancelled by user"));
        assert_eq!(b.order.status, OrderStatus::Pending);

        let sent = settlement.notifications(&parties(&b), &payment);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].notification_type, NotificationType::PaymentFailed);
        assert_eq!(sent[0].recipient_id, b.client.id);
    }

    #[test]
    fn late_failure_after_completion_is_ignored() {
        let mut b = booking("10.00");
        let mut payment = paid(&b);
        let price = b.service.price.clone();

        let settlement = settle(
            &mut payment,
            &mut b.order,
            &price,
            GatewayResult::Failed {
                error_message: Some("timeout".into()),
            },
            Utc::now(),
        );

        assert_eq!(settlement, Settlement::Ignored);
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.error_message.is_none());
    }

    #[test]
    fn full_refund_moves_order_to_refunded() {
        let mut b = booking("100.00");
        b.order.apply_status(OrderStatus::Confirmed, Utc::now());
        let mut payment = paid(&b);
        let price = b.service.price.clone();

        let plan = RefundPlan::for_payment(&payment, None).unwrap();
        let transition = apply_refund(&mut payment, &mut b.order, &plan, None, &price, Utc::now());

        assert_eq!(
            transition,
            Some(StatusTransition {
                old: OrderStatus::Confirmed,
                new: OrderStatus::Refunded
            })
        );
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(payment.refund_amount, dec("100.00"));
        assert_eq!(b.order.status, OrderStatus::Refunded);
    }

    #[test]
    fn partial_refund_leaves_the_order_alone() {
        let mut b = booking("100.00");
        b.order.apply_status(OrderStatus::Confirmed, Utc::now());
        let before = b.order.updated_at;
        let mut payment = paid(&b);
        let price = b.service.price.clone();

        let plan = RefundPlan::for_payment(&payment, Some(dec("40.00"))).unwrap();
        let transition = apply_refund(
            &mut payment,
            &mut b.order,
            &plan,
            Some("re_123".into()),
            &price,
            Utc::now(),
        );

        assert!(transition.is_none());
        assert_eq!(payment.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(payment.refund_amount, dec("40.00"));
        assert_eq!(payment.refund_transaction_id.as_deref(), Some("re_123"));
        assert_eq!(b.order.status, OrderStatus::Confirmed);
        assert_eq!(b.order.updated_at, before);
    }
}
