use thiserror::Error;

use crate::{error::HttpError, models::ordermodel::UnknownOrderStatus};

/// Failures talking to a payment gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered but refused the request.
    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected gateway response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidStatus(#[from] UnknownOrderStatus),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(_)
            | ServiceError::InvalidStatus(_)
            | ServiceError::Gateway(_)
            | ServiceError::InvalidSignature => HttpError::bad_request(error.to_string()),

            ServiceError::Unauthorized(_) => HttpError::forbidden(error.to_string()),

            ServiceError::NotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::Conflict(_) => HttpError::conflict(error.to_string()),

            ServiceError::Database(ref e) => {
                tracing::error!("database error: {}", e);
                HttpError::server_error(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn errors_map_to_http_statuses() {
        let cases: Vec<(ServiceError, StatusCode)> = vec![
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::InvalidStatus(UnknownOrderStatus("shipped".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Gateway(GatewayError::Rejected("declined".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::InvalidSignature, StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized("no".into()), StatusCode::FORBIDDEN),
            (ServiceError::NotFound("Order"), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                ServiceError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(HttpError::from(error).status, status);
        }
    }

    #[test]
    fn gateway_rejection_surfaces_the_gateway_message() {
        let err = HttpError::from(ServiceError::Gateway(GatewayError::Rejected(
            "Invalid PhoneNumber".into(),
        )));
        assert_eq!(err.message, "Invalid PhoneNumber");
    }

    #[test]
    fn unknown_order_status_converts_with_its_source() {
        use std::error::Error as _;
        use crate::models::ordermodel::OrderStatus;

        let err: ServiceError = "shipped".parse::<OrderStatus>().unwrap_err().into();
        assert!(matches!(err, ServiceError::InvalidStatus(_)));
        assert_eq!(err.to_string(), "'shipped' is not a valid order status");
        assert!(err.source().is_some());
    }

    #[test]
    fn not_found_names_the_record() {
        assert_eq!(ServiceError::NotFound("Payment").to_string(), "Payment not found");
    }
}
