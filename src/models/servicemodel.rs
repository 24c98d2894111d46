// models/servicemodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::{BigDecimal, Json};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "category_name", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CategoryName {
    Home,
    Food,
    Beauty,
    Creative,
    Retail,
    Prof,
    Transport,
    Agency,
    Edu,
}

impl CategoryName {
    pub fn display_name(&self) -> &str {
        match self {
            CategoryName::Home => "Home & Personal Services",
            CategoryName::Food => "Food & Catering Services",
            CategoryName::Beauty => "Beauty & Wellness",
            CategoryName::Creative => "Creative & Talent Services",
            CategoryName::Retail => "Products & Retail Services",
            CategoryName::Prof => "Professional & Technical Services",
            CategoryName::Transport => "Transport & Delivery Services",
            CategoryName::Agency => "Agency & Business Services",
            CategoryName::Edu => "Education & Training Services",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "availability_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityType {
    Always,
    Weekday,
    Weekend,
    Custom,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: CategoryName,
    pub description: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image: Option<String>,
    pub location: String,
    pub is_available: bool,
    pub availability_type: AvailabilityType,
    pub experience_years: i32,
    pub total_bookings: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub service_id: Uuid,
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct FavoriteService {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A priced tier of a service, listed cheapest first.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ServicePackage {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub duration_hours: i32,
    pub features: Json<Vec<String>>,
    pub is_popular: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate of a service's reviews.
#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn service(provider_id: Uuid, name: &str, price: BigDecimal) -> Service {
        let now = Utc::now();
        Service {
            id: Uuid::new_v4(),
            provider_id,
            category_id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            price,
            image: None,
            location: "Nairobi".to_string(),
            is_available: true,
            availability_type: AvailabilityType::Always,
            experience_years: 0,
            total_bookings: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
