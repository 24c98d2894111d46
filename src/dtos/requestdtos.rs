use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::requestdb::{NewServiceRequest, ServiceRequestChanges};
use crate::models::requestmodel::{RequestStatus, ServiceRequest, Urgency};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[validate(schema(function = "validate_budget_range", skip_on_field_errors = false))]
pub struct CreateServiceRequestDto {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    pub location: String,
    pub preferred_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub urgency: Urgency,
}

fn validate_budget_range(dto: &CreateServiceRequestDto) -> Result<(), ValidationError> {
    check_budget(dto.budget_min.as_ref(), dto.budget_max.as_ref())
}

fn check_budget(min: Option<&BigDecimal>, max: Option<&BigDecimal>) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            let mut error = ValidationError::new("invalid_budget");
            error.message = Some("Minimum budget cannot exceed maximum budget".into());
            return Err(error);
        }
    }
    Ok(())
}

impl CreateServiceRequestDto {
    pub fn into_new_request(self, client_id: Uuid) -> NewServiceRequest {
        NewServiceRequest {
            client_id,
            category_id: self.category_id,
            title: self.title,
            description: self.description,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            location: self.location,
            preferred_date: self.preferred_date,
            urgency: self.urgency,
        }
    }
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
#[validate(schema(function = "validate_budget_change", skip_on_field_errors = false))]
pub struct UpdateServiceRequestDto {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    #[validate(length(min = 1, max = 200, message = "Location cannot be empty"))]
    pub location: Option<String>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub urgency: Option<Urgency>,
}

fn validate_budget_change(dto: &UpdateServiceRequestDto) -> Result<(), ValidationError> {
    check_budget(dto.budget_min.as_ref(), dto.budget_max.as_ref())
}

impl From<UpdateServiceRequestDto> for ServiceRequestChanges {
    fn from(dto: UpdateServiceRequestDto) -> Self {
        ServiceRequestChanges {
            category_id: dto.category_id,
            title: dto.title,
            description: dto.description,
            budget_min: dto.budget_min,
            budget_max: dto.budget_max,
            location: dto.location,
            preferred_date: dto.preferred_date,
            urgency: dto.urgency,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequestStatusDto {
    pub status: RequestStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignProviderDto {
    pub provider_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceRequestDto {
    #[serde(flatten)]
    pub request: ServiceRequest,
    pub budget_display: String,
}

impl From<ServiceRequest> for ServiceRequestDto {
    fn from(request: ServiceRequest) -> Self {
        ServiceRequestDto {
            budget_display: request.budget_label(),
            request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(min: Option<i64>, max: Option<i64>) -> CreateServiceRequestDto {
        CreateServiceRequestDto {
            category_id: Uuid::new_v4(),
            title: "Fix kitchen sink".into(),
            description: "Leaking pipe under the sink".into(),
            budget_min: min.map(BigDecimal::from),
            budget_max: max.map(BigDecimal::from),
            location: "Kisumu".into(),
            preferred_date: None,
            urgency: Urgency::High,
        }
    }

    #[test]
    fn inverted_budget_is_rejected() {
        assert!(request(Some(5000), Some(1000)).validate().is_err());
        assert!(request(Some(1000), Some(5000)).validate().is_ok());
        assert!(request(None, Some(5000)).validate().is_ok());
    }
}
