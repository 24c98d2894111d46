// config.rs
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone, PartialEq)]
pub enum MpesaEnvironment {
    Sandbox,
    Production,
}

impl MpesaEnvironment {
    pub fn base_url(&self) -> &str {
        match self {
            MpesaEnvironment::Sandbox => "https://sandbox.safaricom.co.ke",
            MpesaEnvironment::Production => "https://api.safaricom.co.ke",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub environment: MpesaEnvironment,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub public_key: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub log_level: LevelFilter,
    pub currency: String,
    pub mpesa: MpesaConfig,
    pub stripe: StripeConfig,
    pub reminder_interval_secs: u64,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:8000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let log_level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|level| level.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::DEBUG);

        let currency = std::env::var("CURRENCY")
            .unwrap_or_else(|_| "kes".to_string())
            .to_lowercase();

        // M-Pesa Daraja (sandbox defaults match Safaricom's public test credentials)
        let environment = match std::env::var("MPESA_ENVIRONMENT").as_deref() {
            Ok("production") => MpesaEnvironment::Production,
            _ => MpesaEnvironment::Sandbox,
        };
        let mpesa = MpesaConfig {
            environment,
            consumer_key: std::env::var("MPESA_CONSUMER_KEY")
                .unwrap_or_else(|_| "your-consumer-key".to_string()),
            consumer_secret: std::env::var("MPESA_CONSUMER_SECRET")
                .unwrap_or_else(|_| "your-consumer-secret".to_string()),
            shortcode: std::env::var("MPESA_SHORTCODE")
                .unwrap_or_else(|_| "174379".to_string()),
            passkey: std::env::var("MPESA_PASSKEY").unwrap_or_else(|_| {
                "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919".to_string()
            }),
        };

        let stripe = StripeConfig {
            public_key: std::env::var("STRIPE_PUBLIC_KEY").unwrap_or_default(),
            secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        };

        let reminder_interval_secs = std::env::var("REMINDER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3600);

        Config {
            database_url,
            base_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().expect("JWT_MAXAGE must be a number of minutes"),
            port,
            allowed_origins,
            log_level,
            currency,
            mpesa,
            stripe,
            reminder_interval_secs,
        }
    }

    pub fn mpesa_callback_url(&self) -> String {
        format!(
            "{}/api/v1/payments/mpesa-callback",
            self.base_url.trim_end_matches('/')
        )
    }
}
