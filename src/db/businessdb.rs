// db/businessdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::businessmodel::BusinessProfile;

#[derive(Debug, Clone)]
pub struct NewBusinessProfile {
    pub business_name: String,
    pub business_type: String,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub business_address: String,
    pub business_phone: String,
    pub website: Option<String>,
    pub description: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BusinessProfileChanges {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
}

#[async_trait]
pub trait BusinessProfileExt {
    async fn get_business_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<BusinessProfile>, sqlx::Error>;

    async fn create_business_profile(
        &self,
        user_id: Uuid,
        profile: NewBusinessProfile,
    ) -> Result<BusinessProfile, sqlx::Error>;

    async fn update_business_profile(
        &self,
        user_id: Uuid,
        changes: BusinessProfileChanges,
    ) -> Result<Option<BusinessProfile>, sqlx::Error>;
}

#[async_trait]
impl BusinessProfileExt for DBClient {
    async fn get_business_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<BusinessProfile>, sqlx::Error> {
        sqlx::query_as::<_, BusinessProfile>(
            r#"
            SELECT id, user_id, business_name, business_type, registration_number, tax_id,
                   business_address, business_phone, website, description, logo,
                   verification_status, verification_documents, rejection_reason,
                   created_at, updated_at
            FROM business_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_business_profile(
        &self,
        user_id: Uuid,
        profile: NewBusinessProfile,
    ) -> Result<BusinessProfile, sqlx::Error> {
        sqlx::query_as::<_, BusinessProfile>(
            r#"
            INSERT INTO business_profiles (user_id, business_name, business_type,
                                           registration_number, tax_id, business_address,
                                           business_phone, website, description, logo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, business_name, business_type, registration_number, tax_id,
                      business_address, business_phone, website, description, logo,
                      verification_status, verification_documents, rejection_reason,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(profile.business_name)
        .bind(profile.business_type)
        .bind(profile.registration_number)
        .bind(profile.tax_id)
        .bind(profile.business_address)
        .bind(profile.business_phone)
        .bind(profile.website)
        .bind(profile.description)
        .bind(profile.logo)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_business_profile(
        &self,
        user_id: Uuid,
        changes: BusinessProfileChanges,
    ) -> Result<Option<BusinessProfile>, sqlx::Error> {
        sqlx::query_as::<_, BusinessProfile>(
            r#"
            UPDATE business_profiles
            SET business_name = COALESCE($2, business_name),
                business_type = COALESCE($3, business_type),
                registration_number = COALESCE($4, registration_number),
                tax_id = COALESCE($5, tax_id),
                business_address = COALESCE($6, business_address),
                business_phone = COALESCE($7, business_phone),
                website = COALESCE($8, website),
                description = COALESCE($9, description),
                logo = COALESCE($10, logo),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING id, user_id, business_name, business_type, registration_number, tax_id,
                      business_address, business_phone, website, description, logo,
                      verification_status, verification_documents, rejection_reason,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(changes.business_name)
        .bind(changes.business_type)
        .bind(changes.registration_number)
        .bind(changes.tax_id)
        .bind(changes.business_address)
        .bind(changes.business_phone)
        .bind(changes.website)
        .bind(changes.description)
        .bind(changes.logo)
        .fetch_optional(&self.pool)
        .await
    }
}
