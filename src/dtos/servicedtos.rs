use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{page_offset, validate_positive_amount};
use crate::db::servicedb::{
    NewPackage, NewService, PackageChanges, ServiceChanges, ServiceFilter,
};
use crate::models::{
    promotionmodel::Promotion,
    servicemodel::{AvailabilityType, RatingSummary, Review, Service, ServicePackage},
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceDto {
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Service name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(custom = "validate_positive_amount")]
    pub price: BigDecimal,

    pub image: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    pub location: String,

    #[serde(default = "default_availability")]
    pub availability_type: AvailabilityType,

    #[validate(range(min = 0, max = 80, message = "Experience must be between 0 and 80 years"))]
    #[serde(default)]
    pub experience_years: i32,
}

fn default_availability() -> AvailabilityType {
    AvailabilityType::Always
}

impl CreateServiceDto {
    pub fn into_new_service(self, provider_id: Uuid) -> NewService {
        NewService {
            provider_id,
            category_id: self.category_id,
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            location: self.location,
            availability_type: self.availability_type,
            experience_years: self.experience_years,
        }
    }
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceDto {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Service name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_amount")]
    pub price: Option<BigDecimal>,
    pub image: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Location cannot be empty"))]
    pub location: Option<String>,
    pub is_available: Option<bool>,
    pub availability_type: Option<AvailabilityType>,
    #[validate(range(min = 0, max = 80, message = "Experience must be between 0 and 80 years"))]
    pub experience_years: Option<i32>,
}

impl From<UpdateServiceDto> for ServiceChanges {
    fn from(dto: UpdateServiceDto) -> Self {
        ServiceChanges {
            category_id: dto.category_id,
            name: dto.name,
            description: dto.description,
            price: dto.price,
            image: dto.image,
            location: dto.location,
            is_available: dto.is_available,
            availability_type: dto.availability_type,
            experience_years: dto.experience_years,
        }
    }
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSearchQuery {
    pub q: Option<String>,
    pub category: Option<Uuid>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub location: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

impl ServiceSearchQuery {
    pub fn filter(&self) -> ServiceFilter {
        ServiceFilter {
            query: self.q.clone().filter(|q| !q.trim().is_empty()),
            category_id: self.category,
            min_price: self.min_price.clone(),
            max_price: self.max_price.clone(),
            location: self.location.clone().filter(|l| !l.trim().is_empty()),
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10) as i64
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.limit())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceDetailDto {
    #[serde(flatten)]
    pub service: Service,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

impl ServiceDetailDto {
    pub fn new(service: Service, rating: RatingSummary) -> Self {
        ServiceDetailDto {
            service,
            average_rating: rating.average_rating,
            review_count: rating.review_count,
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(min = 1, max = 2000, message = "Comment is required"))]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewListDto {
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct PromotionQuoteQuery {
    #[validate(length(min = 1, message = "Promo code is required"))]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromotionQuoteDto {
    pub promotion: Promotion,
    pub original_price: BigDecimal,
    pub discounted_price: BigDecimal,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreatePackageDto {
    #[validate(length(min = 1, max = 100, message = "Package name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(custom = "validate_positive_amount")]
    pub price: BigDecimal,

    #[validate(range(min = 1, max = 720, message = "Duration must be between 1 and 720 hours"))]
    #[serde(default = "default_duration_hours")]
    pub duration_hours: i32,

    #[validate(custom = "validate_features")]
    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub is_popular: bool,
}

fn default_duration_hours() -> i32 {
    1
}

fn validate_features(features: &[String]) -> Result<(), ValidationError> {
    if features.len() > 20 || features.iter().any(|f| f.trim().is_empty()) {
        let mut error = ValidationError::new("invalid_features");
        error.message = Some("Packages list up to 20 non-empty features".into());
        return Err(error);
    }
    Ok(())
}

impl From<CreatePackageDto> for NewPackage {
    fn from(dto: CreatePackageDto) -> Self {
        NewPackage {
            name: dto.name,
            description: dto.description,
            price: dto.price,
            duration_hours: dto.duration_hours,
            features: dto.features,
            is_popular: dto.is_popular,
        }
    }
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePackageDto {
    #[validate(length(min = 1, max = 100, message = "Package name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(custom = "validate_positive_amount")]
    pub price: Option<BigDecimal>,
    #[validate(range(min = 1, max = 720, message = "Duration must be between 1 and 720 hours"))]
    pub duration_hours: Option<i32>,
    #[validate(custom = "validate_features")]
    pub features: Option<Vec<String>>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<UpdatePackageDto> for PackageChanges {
    fn from(dto: UpdatePackageDto) -> Self {
        PackageChanges {
            name: dto.name,
            description: dto.description,
            price: dto.price,
            duration_hours: dto.duration_hours,
            features: dto.features,
            is_popular: dto.is_popular,
            is_active: dto.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackageListDto {
    pub service_id: Uuid,
    pub base_price: BigDecimal,
    pub packages: Vec<ServicePackage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn blank_search_terms_are_dropped() {
        let query = ServiceSearchQuery {
            q: Some("   ".into()),
            location: Some("Mombasa".into()),
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        let filter = query.filter();
        assert!(filter.query.is_none());
        assert_eq!(filter.location.as_deref(), Some("Mombasa"));
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn service_price_must_be_positive() {
        let dto = CreateServiceDto {
            category_id: Uuid::new_v4(),
            name: "House cleaning".into(),
            description: "Deep clean".into(),
            price: BigDecimal::from_str("0").unwrap(),
            image: None,
            location: "Nairobi".into(),
            availability_type: AvailabilityType::Weekday,
            experience_years: 2,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn review_rating_is_bounded() {
        let dto = CreateReviewDto {
            rating: 6,
            comment: "Great".into(),
        };
        assert!(dto.validate().is_err());
    }

    fn package() -> CreatePackageDto {
        serde_json::from_value(serde_json::json!({
            "name": "Standard",
            "description": "Two rooms, deep clean",
            "price": "2500.00",
            "features": ["Supplies included", "Two cleaners"]
        }))
        .unwrap()
    }

    #[test]
    fn package_defaults_fill_in() {
        let dto = package();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.duration_hours, 1);
        assert!(!dto.is_popular);

        let new: NewPackage = dto.into();
        assert_eq!(new.features.len(), 2);
    }

    #[test]
    fn package_features_must_be_non_empty() {
        let mut dto = package();
        dto.features.push("  ".into());
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("features"));

        dto.features = vec!["x".to_string(); 21];
        assert!(dto.validate().is_err());
    }

    #[test]
    fn package_update_checks_present_fields_only() {
        let mut dto = UpdatePackageDto {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());

        dto.duration_hours = Some(0);
        dto.price = Some(BigDecimal::from(-1));
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("duration_hours"));
        assert!(errors.field_errors().contains_key("price"));
    }
}
