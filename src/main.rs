mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::db::db::DBClient;
use service::{
    mpesa::MpesaClient, notification_service::NotificationService, order_service::OrderService,
    payment_service::PaymentService, stripe::StripeClient,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub notification_service: Arc<NotificationService>,
    pub order_service: Arc<OrderService>,
    pub payment_service: Arc<PaymentService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client = Arc::new(db_client);

        let notification_service = Arc::new(NotificationService::new(db_client.clone()));
        let order_service = Arc::new(OrderService::new(
            db_client.clone(),
            notification_service.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            db_client.clone(),
            order_service.clone(),
            Arc::new(MpesaClient::new(config.mpesa.clone())),
            Arc::new(StripeClient::new(config.stripe.clone())),
            config.mpesa_callback_url(),
            config.currency.clone(),
            config.stripe.webhook_secret.clone(),
        ));

        Self {
            env: config,
            db_client,
            notification_service,
            order_service,
            payment_service,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::init();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("Failed to run database migrations: {:?}", err);
        std::process::exit(1);
    }

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ]);

    let app_state = Arc::new(AppState::new(DBClient::new(pool), config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    tokio::spawn(service::background_jobs::start_reminder_job(app_state.clone()));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
