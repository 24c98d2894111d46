// service/mpesa.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::error::GatewayError;
use crate::{config::MpesaConfig, models::paymentmodel::GatewayResult};

/// Daraja validates timestamps against East Africa Time.
const EAT_OFFSET_SECS: i32 = 3 * 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct StkPushRequest {
    /// Whole shillings.
    pub amount: i64,
    pub phone_number: String,
    pub callback_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    pub response_code: String,
    pub response_description: String,
    #[serde(default)]
    pub customer_message: Option<String>,
}

impl StkPushResponse {
    pub fn is_accepted(&self) -> bool {
        self.response_code == "0"
    }
}

#[async_trait]
pub trait MobileMoneyGateway: Send + Sync {
    async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct MpesaClient {
    http: reqwest::Client,
    config: MpesaConfig,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

impl MpesaClient {
    pub fn new(config: MpesaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn base_url(&self) -> &str {
        self.config.environment.base_url()
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let credentials = STANDARD.encode(format!(
            "{}:{}",
            self.config.consumer_key, self.config.consumer_secret
        ));

        let response = self
            .http
            .get(format!(
                "{}/oauth/v1/generate?grant_type=client_credentials",
                self.base_url()
            ))
            .header("Authorization", format!("Basic {}", credentials))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected(format!(
                "M-Pesa authentication failed with status {}",
                response.status()
            )));
        }

        let token: AccessTokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    pub fn timestamp(now: DateTime<Utc>) -> String {
        match FixedOffset::east_opt(EAT_OFFSET_SECS) {
            Some(eat) => now.with_timezone(&eat).format("%Y%m%d%H%M%S").to_string(),
            None => now.format("%Y%m%d%H%M%S").to_string(),
        }
    }

    pub fn password(&self, timestamp: &str) -> String {
        STANDARD.encode(format!(
            "{}{}{}",
            self.config.shortcode, self.config.passkey, timestamp
        ))
    }

    pub fn stk_payload(&self, request: &StkPushRequest, timestamp: &str) -> serde_json::Value {
        serde_json::json!({
            "BusinessShortCode": self.config.shortcode,
            "Password": self.password(timestamp),
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": request.amount,
            "PartyA": request.phone_number,
            "PartyB": self.config.shortcode,
            "PhoneNumber": request.phone_number,
            "CallBackURL": request.callback_url,
            "AccountReference": request.account_reference,
            "TransactionDesc": request.transaction_desc,
        })
    }
}

#[async_trait]
impl MobileMoneyGateway for MpesaClient {
    async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, GatewayError> {
        let token = self.access_token().await?;
        let timestamp = Self::timestamp(Utc::now());
        let payload = self.stk_payload(&request, &timestamp);

        let response = self
            .http
            .post(format!("{}/mpesa/stkpush/v1/processrequest", self.base_url()))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        parse_stk_response(body)
    }
}

/// Daraja answers errors with `errorMessage` instead of the usual fields.
fn parse_stk_response(body: serde_json::Value) -> Result<StkPushResponse, GatewayError> {
    if body.get("ResponseCode").is_none() {
        let message = body["errorMessage"]
            .as_str()
            .unwrap_or("STK push request was not accepted")
            .to_string();
        return Err(GatewayError::Rejected(message));
    }

    serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    pub result_code: i64,
    pub result_desc: String,
    #[serde(default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<CallbackItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<serde_json::Value>,
}

impl StkCallback {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// The M-Pesa receipt number. Looked up by name, else the second item.
    pub fn transaction_id(&self) -> Option<String> {
        let items = &self.callback_metadata.as_ref()?.items;
        let item = items
            .iter()
            .find(|item| item.name == "MpesaReceiptNumber")
            .or_else(|| items.get(1))?;

        match item.value.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn to_gateway_result(&self) -> GatewayResult {
        if self.is_success() {
            GatewayResult::Succeeded {
                transaction_id: self.transaction_id(),
                card_brand: None,
                card_last4: None,
                metadata: serde_json::to_value(self).ok(),
            }
        } else {
            GatewayResult::Failed {
                error_message: Some(self.result_desc.clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MpesaEnvironment;
    use chrono::TimeZone;

    fn client() -> MpesaClient {
        MpesaClient::new(MpesaConfig {
            environment: MpesaEnvironment::Sandbox,
            consumer_key: "key".into(),
            consumer_secret: "secret".into(),
            shortcode: "174379".into(),
            passkey: "passkey".into(),
        })
    }

    fn request() -> StkPushRequest {
        StkPushRequest {
            amount: 100,
            phone_number: "254708374149".into(),
            callback_url: "https://example.com/api/v1/payments/mpesa-callback".into(),
            account_reference: "Order#42".into(),
            transaction_desc: "Payment for Order#42".into(),
        }
    }

    #[test]
    fn timestamp_is_in_east_africa_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 22, 15, 9).unwrap();
        assert_eq!(MpesaClient::timestamp(now), "20240201011509");
    }

    #[test]
    fn password_is_base64_of_shortcode_passkey_timestamp() {
        let password = client().password("20240201011509");
        let decoded = STANDARD.decode(password).unwrap();
        assert_eq!(decoded, b"174379passkey20240201011509");
    }

    #[test]
    fn payload_carries_order_reference_and_callback() {
        let payload = client().stk_payload(&request(), "20240201011509");
        assert_eq!(payload["TransactionType"], "CustomerPayBillOnline");
        assert_eq!(payload["Amount"], 100);
        assert_eq!(payload["PartyA"], "254708374149");
        assert_eq!(payload["PartyB"], "174379");
        assert_eq!(payload["AccountReference"], "Order#42");
        assert_eq!(payload["TransactionDesc"], "Payment for Order#42");
        assert_eq!(
            payload["CallBackURL"],
            "https://example.com/api/v1/payments/mpesa-callback"
        );
    }

    #[test]
    fn accepted_and_rejected_push_responses() {
        let accepted = parse_stk_response(serde_json::json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "Success. Request accepted for processing"
        }))
        .unwrap();
        assert!(accepted.is_accepted());
        assert_eq!(accepted.checkout_request_id, "ws_CO_191220191020363925");

        let declined = parse_stk_response(serde_json::json!({
            "MerchantRequestID": "1",
            "CheckoutRequestID": "2",
            "ResponseCode": "1",
            "ResponseDescription": "Rejected"
        }))
        .unwrap();
        assert!(!declined.is_accepted());

        let error = parse_stk_response(serde_json::json!({
            "requestId": "abc",
            "errorCode": "400.002.02",
            "errorMessage": "Bad Request - Invalid PhoneNumber"
        }))
        .unwrap_err();
        assert_eq!(error.to_string(), "Bad Request - Invalid PhoneNumber");
    }

    #[test]
    fn successful_callback_yields_receipt_number() {
        let envelope: StkCallbackEnvelope = serde_json::from_value(serde_json::json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "Amount", "Value": 100 },
                            { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                            { "Name": "TransactionDate", "Value": 20191219102115u64 },
                            { "Name": "PhoneNumber", "Value": 254708374149u64 }
                        ]
                    }
                }
            }
        }))
        .unwrap();

        let callback = envelope.body.stk_callback;
        assert!(callback.is_success());
        match callback.to_gateway_result() {
            GatewayResult::Succeeded { transaction_id, .. } => {
                assert_eq!(transaction_id.as_deref(), Some("NLJ7RT61SV"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn failed_callback_keeps_result_description() {
        let envelope: StkCallbackEnvelope = serde_json::from_value(serde_json::json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "1",
                    "CheckoutRequestID": "ws_CO_1",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        }))
        .unwrap();

        let callback = envelope.body.stk_callback;
        assert!(callback.transaction_id().is_none());
        assert_eq!(
            callback.to_gateway_result(),
            GatewayResult::Failed {
                error_message: Some("Request cancelled by user".into())
            }
        );
    }

    struct AlwaysAccepts;

    #[async_trait]
    impl MobileMoneyGateway for AlwaysAccepts {
        async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, GatewayError> {
            Ok(StkPushResponse {
                merchant_request_id: "m-1".into(),
                checkout_request_id: format!("ws_{}", request.account_reference),
                response_code: "0".into(),
                response_description: "Accepted".into(),
                customer_message: None,
            })
        }
    }

    #[tokio::test]
    async fn gateway_trait_is_object_safe() {
        let gateway: Box<dyn MobileMoneyGateway> = Box::new(AlwaysAccepts);
        let response = gateway.stk_push(request()).await.unwrap();
        assert_eq!(response.checkout_request_id, "ws_Order#42");
    }
}
