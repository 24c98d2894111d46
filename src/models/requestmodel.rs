// models/requestmodel.rs
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "request_urgency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    Quoted,
    Assigned,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn to_str(&self) -> &str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::Quoted => "quoted",
            RequestStatus::Assigned => "assigned",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub location: String,
    pub preferred_date: Option<DateTime<Utc>>,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub assigned_provider_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Human readable budget; a zero bound counts as unset.
    pub fn budget_label(&self) -> String {
        let set = |v: &Option<BigDecimal>| v.clone().filter(|b| !b.is_zero());
        match (set(&self.budget_min), set(&self.budget_max)) {
            (Some(min), Some(max)) => format!("KES {} - KES {}", min, max),
            (Some(min), None) => format!("KES {}+", min),
            (None, Some(max)) => format!("Up to KES {}", max),
            (None, None) => "Budget not specified".to_string(),
        }
    }

    pub fn is_visible_to_provider(&self, provider_id: Uuid) -> bool {
        self.status == RequestStatus::Open || self.assigned_provider_id == Some(provider_id)
    }
}
