pub mod chatdtos;
pub mod notificationdtos;
pub mod orderdtos;
pub mod paymentdtos;
pub mod requestdtos;
pub mod scheduledtos;
pub mod servicedtos;
pub mod userdtos;

use num_traits::Zero;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use validator::{Validate, ValidationError};

/// Highest page number any listing accepts.
pub const MAX_PAGE: usize = 10_000;

/// Row offset for a 1-based page. Callers validate `page` against `MAX_PAGE` first.
pub(crate) fn page_offset(page: Option<usize>, limit: i64) -> i64 {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE) as i64;
    (page - 1) * limit
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

impl RequestQueryDto {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(10)
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.limit() as i64)
    }
}

#[derive(Serialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

pub(crate) fn validate_positive_amount(amount: &BigDecimal) -> Result<(), ValidationError> {
    if *amount <= BigDecimal::zero() {
        let mut error = ValidationError::new("invalid_amount");
        error.message = Some("Amount must be greater than zero".into());
        return Err(error);
    }
    Ok(())
}
