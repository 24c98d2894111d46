use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::paymentdtos::{CreatePaymentDto, RefundDto},
    error::HttpError,
    middleware::{auth, JWTAuthMiddeware},
    service::mpesa::StkCallbackEnvelope,
    AppState,
};

pub fn payments_handler() -> Router {
    let protected_routes = Router::new()
        .route("/", post(create_payment))
        .route("/history", get(payment_history))
        .route("/:payment_id", get(get_payment))
        .route("/:payment_id/refund", post(refund_payment))
        .layer(middleware::from_fn(auth));

    // Called by the gateways; authenticated by payload matching and signatures.
    let public_routes = Router::new()
        .route("/mpesa-callback", post(mpesa_callback))
        .route("/stripe-webhook", post(stripe_webhook));

    Router::new().merge(protected_routes).merge(public_routes)
}

pub async fn create_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreatePaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let initiation = app_state.payment_service.initiate(&user.user, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": initiation })),
    ))
}

/// Daraja needs a success acknowledgement even when the payload can't be used,
/// otherwise it keeps retrying.
pub async fn mpesa_callback(
    Extension(app_state): Extension<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    match serde_json::from_slice::<StkCallbackEnvelope>(&body) {
        Ok(envelope) => {
            let callback = envelope.body.stk_callback;
            tracing::info!(
                "M-Pesa callback for {}: {} ({})",
                callback.checkout_request_id,
                callback.result_code,
                callback.result_desc
            );
            if let Err(e) = app_state.payment_service.handle_mpesa_callback(&callback).await {
                tracing::error!(
                    "failed to apply M-Pesa callback {}: {}",
                    callback.checkout_request_id,
                    e
                );
            }
        }
        Err(e) => tracing::warn!("unreadable M-Pesa callback: {}", e),
    }

    Json(json!({ "ResultCode": 0, "ResultDesc": "Accepted" }))
}

pub async fn stripe_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok());

    let event = app_state.payment_service.verify_stripe_event(&body, signature)?;
    tracing::info!("Stripe event {} ({})", event.id, event.event_type);

    app_state.payment_service.handle_stripe_event(&event).await?;

    Ok(Json(json!({ "received": true })))
}

pub async fn payment_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.payment_service.history(&user.user).await?;

    Ok(Json(json!({
        "status": "success",
        "results": payments.len(),
        "data": payments
    })))
}

pub async fn get_payment(
    Path(payment_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state.payment_service.detail(&user.user, payment_id).await?;
    Ok(Json(json!({ "status": "success", "data": payment })))
}

pub async fn refund_payment(
    Path(payment_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    body: Option<Json<RefundDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.map(|Json(dto)| dto).unwrap_or_default();
    body.validate()?;

    let payment = app_state
        .payment_service
        .refund(&user.user, payment_id, body.amount)
        .await?;

    Ok(Json(json!({ "status": "success", "data": payment })))
}
