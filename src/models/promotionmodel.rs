// models/promotionmodel.rs
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::servicemodel::Service;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "discount_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "promotion_scope", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PromotionScope {
    All,
    Category,
    Service,
    Provider,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Promotion {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: BigDecimal,
    pub applicable_to: PromotionScope,
    pub category_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub is_active: bool,
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date <= now
            && now <= self.end_date
            && self.usage_limit.map_or(true, |limit| self.usage_count < limit)
    }

    pub fn applies_to(&self, service: &Service) -> bool {
        match self.applicable_to {
            PromotionScope::All => true,
            PromotionScope::Category => self.category_id == Some(service.category_id),
            PromotionScope::Service => self.service_id == Some(service.id),
            PromotionScope::Provider => self.provider_id == Some(service.provider_id),
        }
    }

    /// Discounted price, or `original_price` unchanged when the promotion is not valid.
    pub fn apply_discount(&self, original_price: &BigDecimal, now: DateTime<Utc>) -> BigDecimal {
        if !self.is_valid(now) {
            return original_price.clone();
        }

        let discount = match self.discount_type {
            DiscountType::Percentage => {
                (original_price * &self.discount_value / BigDecimal::from(100)).round(2)
            }
            DiscountType::Fixed => {
                if &self.discount_value < original_price {
                    self.discount_value.clone()
                } else {
                    original_price.clone()
                }
            }
        };

        let discounted = original_price - discount;
        if discounted < BigDecimal::zero() {
            BigDecimal::zero()
        } else {
            discounted
        }
    }
}
