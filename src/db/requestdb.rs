// db/requestdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::requestmodel::{RequestStatus, ServiceRequest, Urgency};

#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub location: String,
    pub preferred_date: Option<DateTime<Utc>>,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceRequestChanges {
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub location: Option<String>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub urgency: Option<Urgency>,
}

#[async_trait]
pub trait ServiceRequestExt {
    async fn create_service_request(
        &self,
        request: NewServiceRequest,
    ) -> Result<ServiceRequest, sqlx::Error>;

    async fn get_service_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<ServiceRequest>, sqlx::Error>;

    async fn get_client_service_requests(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error>;

    /// Open requests plus the ones assigned to `provider_id`.
    async fn get_provider_service_requests(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error>;

    async fn update_service_request(
        &self,
        request_id: Uuid,
        changes: ServiceRequestChanges,
    ) -> Result<ServiceRequest, sqlx::Error>;

    async fn update_service_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<ServiceRequest, sqlx::Error>;

    async fn assign_service_request(
        &self,
        request_id: Uuid,
        provider_id: Uuid,
    ) -> Result<ServiceRequest, sqlx::Error>;

    async fn delete_service_request(&self, request_id: Uuid) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl ServiceRequestExt for DBClient {
    async fn create_service_request(
        &self,
        request: NewServiceRequest,
    ) -> Result<ServiceRequest, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (client_id, category_id, title, description,
                                          budget_min, budget_max, location,
                                          preferred_date, urgency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, client_id, category_id, title, description, budget_min, budget_max,
                      location, preferred_date, urgency, status, assigned_provider_id,
                      created_at, updated_at
            "#,
        )
        .bind(request.client_id)
        .bind(request.category_id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.budget_min)
        .bind(request.budget_max)
        .bind(request.location)
        .bind(request.preferred_date)
        .bind(request.urgency)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_service_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<ServiceRequest>, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, client_id, category_id, title, description, budget_min, budget_max,
                   location, preferred_date, urgency, status, assigned_provider_id,
                   created_at, updated_at
            FROM service_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_client_service_requests(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, client_id, category_id, title, description, budget_min, budget_max,
                   location, preferred_date, urgency, status, assigned_provider_id,
                   created_at, updated_at
            FROM service_requests
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_provider_service_requests(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ServiceRequest>, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, client_id, category_id, title, description, budget_min, budget_max,
                   location, preferred_date, urgency, status, assigned_provider_id,
                   created_at, updated_at
            FROM service_requests
            WHERE status = 'open'::request_status OR assigned_provider_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_service_request(
        &self,
        request_id: Uuid,
        changes: ServiceRequestChanges,
    ) -> Result<ServiceRequest, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET category_id = COALESCE($2, category_id),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                budget_min = COALESCE($5, budget_min),
                budget_max = COALESCE($6, budget_max),
                location = COALESCE($7, location),
                preferred_date = COALESCE($8, preferred_date),
                urgency = COALESCE($9, urgency),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, client_id, category_id, title, description, budget_min, budget_max,
                      location, preferred_date, urgency, status, assigned_provider_id,
                      created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(changes.category_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.budget_min)
        .bind(changes.budget_max)
        .bind(changes.location)
        .bind(changes.preferred_date)
        .bind(changes.urgency)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_service_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> Result<ServiceRequest, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, client_id, category_id, title, description, budget_min, budget_max,
                      location, preferred_date, urgency, status, assigned_provider_id,
                      created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn assign_service_request(
        &self,
        request_id: Uuid,
        provider_id: Uuid,
    ) -> Result<ServiceRequest, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET assigned_provider_id = $2,
                status = 'assigned'::request_status,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, client_id, category_id, title, description, budget_min, budget_max,
                      location, preferred_date, urgency, status, assigned_provider_id,
                      created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(provider_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_service_request(&self, request_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
