pub mod actor;
pub mod background_jobs;
pub mod error;
pub mod mpesa;
pub mod notification_service;
pub mod order_service;
pub mod payment_service;
pub mod stripe;
