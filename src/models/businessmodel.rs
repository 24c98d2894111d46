// models/businessmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "business_verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

/// Registration details of a business account. Verification fields are
/// maintained by operators directly in the database.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub business_type: String,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub business_address: String,
    pub business_phone: String,
    pub website: Option<String>,
    pub description: String,
    pub logo: Option<String>,
    pub verification_status: VerificationStatus,
    pub verification_documents: Json<Vec<String>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessProfile {
    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_verified_profiles_count_as_verified() {
        let mut profile = fixtures::profile(Uuid::new_v4(), "Mama Oliech Catering");
        assert!(!profile.is_verified());

        profile.verification_status = VerificationStatus::Rejected;
        assert!(!profile.is_verified());

        profile.verification_status = VerificationStatus::Verified;
        assert!(profile.is_verified());
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let json = serde_json::to_value(VerificationStatus::Verified).unwrap();
        assert_eq!(json, "verified");
        assert_eq!(VerificationStatus::default(), VerificationStatus::Pending);
    }
}
