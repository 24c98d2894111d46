// service/stripe.rs
use std::collections::HashMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::error::GatewayError;
use crate::{config::StripeConfig, models::paymentmodel::GatewayResult};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    /// Minor units (cents).
    pub amount: i64,
    pub currency: String,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundRequest {
    pub payment_intent_id: String,
    /// Minor units (cents).
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeRefund {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait CardGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn create_refund(&self, request: RefundRequest) -> Result<StripeRefund, GatewayError>;

    fn publishable_key(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn post_form<T: DeserializeOwned + Send>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(format!("{}{}", self.config.api_base.trim_end_matches('/'), path))
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("Stripe request failed")
                .to_string();
            return Err(GatewayError::Rejected(message));
        }

        serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CardGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.to_lowercase()),
            ("metadata[order_id]", request.order_id.to_string()),
        ];

        self.post_form("/v1/payment_intents", &form).await
    }

    async fn create_refund(&self, request: RefundRequest) -> Result<StripeRefund, GatewayError> {
        let form = [
            ("payment_intent", request.payment_intent_id),
            ("amount", request.amount.to_string()),
        ];

        self.post_form("/v1/refunds", &form).await
    }

    fn publishable_key(&self) -> &str {
        &self.config.public_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    MalformedHeader,
    Mismatch,
    Expired,
}

/// Checks a `Stripe-Signature` header (`t=<ts>,v1=<hex>[,v1=...]`) against the raw body.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let expected = compute_signature(payload, timestamp, secret)?;
    let matched = signatures
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

fn compute_signature(
    payload: &[u8],
    timestamp: i64,
    secret: &str,
) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// The payment intent id and its result, for the two events we act on.
    pub fn payment_intent_result(&self) -> Option<(String, GatewayResult)> {
        let intent = &self.data.object;
        let intent_id = intent["id"].as_str()?.to_string();

        match self.event_type.as_str() {
            "payment_intent.succeeded" => {
                let card = &intent["charges"]["data"][0]["payment_method_details"]["card"];
                Some((
                    intent_id.clone(),
                    GatewayResult::Succeeded {
                        transaction_id: Some(intent_id),
                        card_brand: card["brand"].as_str().map(str::to_string),
                        card_last4: card["last4"].as_str().map(str::to_string),
                        metadata: Some(intent.clone()),
                    },
                ))
            }
            "payment_intent.payment_failed" => {
                let message = intent["last_payment_error"]["message"]
                    .as_str()
                    .unwrap_or("Payment failed")
                    .to_string();
                Some((
                    intent_id,
                    GatewayResult::Failed {
                        error_message: Some(message),
                    },
                ))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn header_for(payload: &[u8], timestamp: i64) -> String {
        let signature = compute_signature(payload, timestamp, SECRET).unwrap();
        format!("t={},v1={}", timestamp, signature)
    }

    #[test]
    fn valid_signature_is_accepted() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = header_for(payload, 1_700_000_000);
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 1_700_000_100),
            Ok(())
        );
    }

    #[test]
    fn any_matching_v1_signature_is_enough() {
        let payload = br#"{"id":"evt_1"}"#;
        let good = compute_signature(payload, 1_700_000_000, SECRET).unwrap();
        let header = format!("t=1700000000,v1=deadbeef,v0=old,v1={}", good);
        assert!(verify_webhook_signature(payload, &header, SECRET, 1_700_000_000).is_ok());
    }

    #[test]
    fn tampered_payload_or_wrong_secret_is_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = header_for(payload, 1_700_000_000);

        assert_eq!(
            verify_webhook_signature(br#"{"id":"evt_2"}"#, &header, SECRET, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify_webhook_signature(payload, &header, "whsec_other", 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_signature_is_rejected() {
        let payload = b"{}";
        let header = header_for(payload, 1_700_000_000);
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 1_700_000_000 + 301),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for header in ["", "v1=abc", "t=notanumber,v1=abc", "t=1700000000"] {
            assert_eq!(
                verify_webhook_signature(b"{}", header, SECRET, 1_700_000_000),
                Err(SignatureError::MalformedHeader)
            );
        }
    }

    fn event(event_type: &str, object: serde_json::Value) -> WebhookEvent {
        serde_json::from_value(serde_json::json!({
            "id": "evt_123",
            "type": event_type,
            "data": { "object": object }
        }))
        .unwrap()
    }

    #[test]
    fn succeeded_intent_completes_with_intent_id() {
        let event = event(
            "payment_intent.succeeded",
            serde_json::json!({ "id": "pi_123", "status": "succeeded" }),
        );

        let (intent_id, result) = event.payment_intent_result().unwrap();
        assert_eq!(intent_id, "pi_123");
        match result {
            GatewayResult::Succeeded {
                transaction_id,
                metadata,
                ..
            } => {
                assert_eq!(transaction_id.as_deref(), Some("pi_123"));
                assert_eq!(metadata.unwrap()["status"], "succeeded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn failed_intent_uses_last_error_message_or_default() {
        let with_message = event(
            "payment_intent.payment_failed",
            serde_json::json!({
                "id": "pi_1",
                "last_payment_error": { "message": "Your card was declined." }
            }),
        );
        assert_eq!(
            with_message.payment_intent_result().unwrap().1,
            GatewayResult::Failed {
                error_message: Some("Your card was declined.".into())
            }
        );

        let without = event("payment_intent.payment_failed", serde_json::json!({ "id": "pi_2" }));
        assert_eq!(
            without.payment_intent_result().unwrap().1,
            GatewayResult::Failed {
                error_message: Some("Payment failed".into())
            }
        );
    }

    #[test]
    fn other_events_are_ignored() {
        let event = event("charge.refunded", serde_json::json!({ "id": "ch_1" }));
        assert!(event.payment_intent_result().is_none());
    }

    struct FakeStripe;

    #[async_trait]
    impl CardGateway for FakeStripe {
        async fn create_payment_intent(
            &self,
            request: PaymentIntentRequest,
        ) -> Result<PaymentIntent, GatewayError> {
            Ok(PaymentIntent {
                id: "pi_fake".into(),
                client_secret: Some("pi_fake_secret".into()),
                status: "requires_payment_method".into(),
                amount: request.amount,
                currency: request.currency,
                metadata: HashMap::from([("order_id".to_string(), request.order_id.to_string())]),
            })
        }

        async fn create_refund(
            &self,
            _request: RefundRequest,
        ) -> Result<StripeRefund, GatewayError> {
            Err(GatewayError::Rejected("Charge already refunded".into()))
        }

        fn publishable_key(&self) -> &str {
            "pk_test"
        }
    }

    #[tokio::test]
    async fn card_gateway_through_trait_object() {
        let gateway: Box<dyn CardGateway> = Box::new(FakeStripe);
        let order_id = Uuid::new_v4();

        let intent = gateway
            .create_payment_intent(PaymentIntentRequest {
                amount: 10000,
                currency: "kes".into(),
                order_id,
            })
            .await
            .unwrap();
        assert_eq!(intent.amount, 10000);
        assert_eq!(intent.metadata["order_id"], order_id.to_string());

        let refund = gateway
            .create_refund(RefundRequest {
                payment_intent_id: "pi_fake".into(),
                amount: 10000,
            })
            .await;
        assert_eq!(refund.unwrap_err().to_string(), "Charge already refunded");
    }
}
