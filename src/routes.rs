use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler, chat::chat_handler, notifications::notifications_handler,
        orders::orders_handler, payments::payments_handler,
        service_requests::service_requests_handler, services::services_handler,
        users::users_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/services", services_handler())
        .nest("/orders", orders_handler().layer(middleware::from_fn(auth)))
        // Payments mix authenticated routes with gateway callbacks.
        .nest("/payments", payments_handler())
        .nest(
            "/notifications",
            notifications_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/conversations",
            chat_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/service-requests",
            service_requests_handler().layer(middleware::from_fn(auth)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tracing_subscriber::filter::LevelFilter;

    use crate::{
        config::{Config, MpesaConfig, MpesaEnvironment, StripeConfig},
        db::db::DBClient,
    };

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/huduma_test".into(),
            base_url: "http://localhost:8000".into(),
            jwt_secret: "test-secret".into(),
            jwt_maxage: 60,
            port: 8000,
            allowed_origins: vec![],
            log_level: LevelFilter::OFF,
            currency: "kes".into(),
            mpesa: MpesaConfig {
                environment: MpesaEnvironment::Sandbox,
                consumer_key: "key".into(),
                consumer_secret: "secret".into(),
                shortcode: "174379".into(),
                passkey: "passkey".into(),
            },
            stripe: StripeConfig {
                public_key: "pk_test".into(),
                secret_key: "sk_test".into(),
                webhook_secret: "whsec_test".into(),
                api_base: "http://localhost:12111".into(),
            },
            reminder_interval_secs: 3600,
        }
    }

    // The pool never connects; every request here is answered before a query runs.
    fn app() -> Router {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        create_router(Arc::new(AppState::new(DBClient::new(pool), config)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_responds() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in [
            "/api/v1/orders",
            "/api/v1/users/me",
            "/api/v1/notifications",
            "/api/v1/payments/history",
            "/api/v1/users/dashboard/provider",
            "/api/v1/users/me/business-profile",
            "/api/v1/services/schedule",
        ] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/orders")
                    .header("Authorization", "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["status"], "fail");
    }

    #[tokio::test]
    async fn unreadable_mpesa_callback_is_still_acknowledged() {
        let response = app()
            .oneshot(
                Request::post("/api/v1/payments/mpesa-callback")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{\"unexpected\": true}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ResultCode"], 0);
        assert_eq!(body["ResultDesc"], "Accepted");
    }

    #[tokio::test]
    async fn unsigned_stripe_webhook_is_refused() {
        let response = app()
            .oneshot(
                Request::post("/api/v1/payments/stripe-webhook")
                    .body(Body::from("{\"id\":\"evt_1\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
