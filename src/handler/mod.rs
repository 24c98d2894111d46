pub mod auth;
pub mod chat;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod schedules;
pub mod service_requests;
pub mod services;
pub mod users;
