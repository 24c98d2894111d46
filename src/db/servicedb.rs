// db/servicedb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::{BigDecimal, Json};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    promotionmodel::Promotion,
    servicemodel::{
        AvailabilityType, Category, FavoriteService, RatingSummary, Review, Service,
        ServicePackage,
    },
};

/// Search parameters for the public service listing.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub query: Option<String>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image: Option<String>,
    pub location: String,
    pub availability_type: AvailabilityType,
    pub experience_years: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceChanges {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub is_available: Option<bool>,
    pub availability_type: Option<AvailabilityType>,
    pub experience_years: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewPackage {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub duration_hours: i32,
    pub features: Vec<String>,
    pub is_popular: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PackageChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub duration_hours: Option<i32>,
    pub features: Option<Vec<String>>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait ServiceExt {
    async fn get_categories(&self) -> Result<Vec<Category>, sqlx::Error>;

    async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, sqlx::Error>;

    async fn search_services(
        &self,
        filter: &ServiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Service>, sqlx::Error>;

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error>;

    async fn get_provider_services(&self, provider_id: Uuid) -> Result<Vec<Service>, sqlx::Error>;

    async fn create_service(&self, service: NewService) -> Result<Service, sqlx::Error>;

    async fn update_service(
        &self,
        service_id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Service, sqlx::Error>;

    async fn delete_service(&self, service_id: Uuid) -> Result<(), sqlx::Error>;

    async fn increment_total_bookings(&self, service_id: Uuid) -> Result<(), sqlx::Error>;

    // Reviews
    async fn get_rating_summary(&self, service_id: Uuid) -> Result<RatingSummary, sqlx::Error>;

    async fn get_reviews(&self, service_id: Uuid) -> Result<Vec<Review>, sqlx::Error>;

    async fn has_completed_order(
        &self,
        client_id: Uuid,
        service_id: Uuid,
    ) -> Result<bool, sqlx::Error>;

    async fn create_review(
        &self,
        service: &Service,
        client_id: Uuid,
        rating: i32,
        comment: String,
        is_verified: bool,
    ) -> Result<Review, sqlx::Error>;

    // Favorites
    async fn add_favorite(
        &self,
        user_id: Uuid,
        service_id: Uuid,
    ) -> Result<FavoriteService, sqlx::Error>;

    async fn remove_favorite(&self, user_id: Uuid, service_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn get_favorite_services(&self, user_id: Uuid) -> Result<Vec<Service>, sqlx::Error>;

    // Packages
    async fn get_service_packages(
        &self,
        service_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<ServicePackage>, sqlx::Error>;

    async fn get_package(&self, package_id: Uuid) -> Result<Option<ServicePackage>, sqlx::Error>;

    async fn create_package(
        &self,
        service_id: Uuid,
        package: NewPackage,
    ) -> Result<ServicePackage, sqlx::Error>;

    async fn update_package(
        &self,
        package_id: Uuid,
        changes: PackageChanges,
    ) -> Result<ServicePackage, sqlx::Error>;

    async fn delete_package(&self, package_id: Uuid) -> Result<(), sqlx::Error>;

    // Promotions
    async fn get_active_promotions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>, sqlx::Error>;

    async fn get_promotion_by_code(&self, code: &str) -> Result<Option<Promotion>, sqlx::Error>;
}

#[async_trait]
impl ServiceExt for DBClient {
    async fn get_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, icon, created_at
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_category(&self, category_id: Uuid) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, icon, created_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn search_services(
        &self,
        filter: &ServiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Service>, sqlx::Error> {
        let pattern = filter.query.as_ref().map(|q| format!("%{}%", q));
        let location = filter.location.as_ref().map(|l| format!("%{}%", l));

        sqlx::query_as::<_, Service>(
            r#"
            SELECT id, provider_id, category_id, name, description, price, image,
                   location, is_available, availability_type, experience_years,
                   total_bookings, created_at, updated_at
            FROM services
            WHERE is_available = TRUE
              AND ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3::numeric IS NULL OR price >= $3)
              AND ($4::numeric IS NULL OR price <= $4)
              AND ($5::text IS NULL OR location ILIKE $5)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(pattern)
        .bind(filter.category_id)
        .bind(filter.min_price.clone())
        .bind(filter.max_price.clone())
        .bind(location)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT id, provider_id, category_id, name, description, price, image,
                   location, is_available, availability_type, experience_years,
                   total_bookings, created_at, updated_at
            FROM services
            WHERE id = $1
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_provider_services(&self, provider_id: Uuid) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT id, provider_id, category_id, name, description, price, image,
                   location, is_available, availability_type, experience_years,
                   total_bookings, created_at, updated_at
            FROM services
            WHERE provider_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_service(&self, service: NewService) -> Result<Service, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (provider_id, category_id, name, description, price,
                                  image, location, availability_type, experience_years)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, provider_id, category_id, name, description, price, image,
                      location, is_available, availability_type, experience_years,
                      total_bookings, created_at, updated_at
            "#,
        )
        .bind(service.provider_id)
        .bind(service.category_id)
        .bind(service.name)
        .bind(service.description)
        .bind(service.price)
        .bind(service.image)
        .bind(service.location)
        .bind(service.availability_type)
        .bind(service.experience_years)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_service(
        &self,
        service_id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Service, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                image = COALESCE($6, image),
                location = COALESCE($7, location),
                is_available = COALESCE($8, is_available),
                availability_type = COALESCE($9, availability_type),
                experience_years = COALESCE($10, experience_years),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, provider_id, category_id, name, description, price, image,
                      location, is_available, availability_type, experience_years,
                      total_bookings, created_at, updated_at
            "#,
        )
        .bind(service_id)
        .bind(changes.category_id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.image)
        .bind(changes.location)
        .bind(changes.is_available)
        .bind(changes.availability_type)
        .bind(changes.experience_years)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_service(&self, service_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(service_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment_total_bookings(&self, service_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE services
            SET total_bookings = total_bookings + 1
            WHERE id = $1
            "#,
        )
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_rating_summary(&self, service_id: Uuid) -> Result<RatingSummary, sqlx::Error> {
        sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT AVG(rating)::float8 AS average_rating,
                   COUNT(*) AS review_count
            FROM reviews
            WHERE service_id = $1
            "#,
        )
        .bind(service_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_reviews(&self, service_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT id, service_id, client_id, provider_id, rating, comment,
                   is_verified, created_at, updated_at
            FROM reviews
            WHERE service_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn has_completed_order(
        &self,
        client_id: Uuid,
        service_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM orders
                WHERE client_id = $1 AND service_id = $2
                  AND status = 'completed'::order_status
            )
            "#,
        )
        .bind(client_id)
        .bind(service_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_review(
        &self,
        service: &Service,
        client_id: Uuid,
        rating: i32,
        comment: String,
        is_verified: bool,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (service_id, client_id, provider_id, rating, comment, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, service_id, client_id, provider_id, rating, comment,
                      is_verified, created_at, updated_at
            "#,
        )
        .bind(service.id)
        .bind(client_id)
        .bind(service.provider_id)
        .bind(rating)
        .bind(comment)
        .bind(is_verified)
        .fetch_one(&self.pool)
        .await
    }

    async fn add_favorite(
        &self,
        user_id: Uuid,
        service_id: Uuid,
    ) -> Result<FavoriteService, sqlx::Error> {
        sqlx::query_as::<_, FavoriteService>(
            r#"
            INSERT INTO favorite_services (user_id, service_id)
            VALUES ($1, $2)
            RETURNING id, user_id, service_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(service_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn remove_favorite(&self, user_id: Uuid, service_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM favorite_services
            WHERE user_id = $1 AND service_id = $2
            "#,
        )
        .bind(user_id)
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_favorite_services(&self, user_id: Uuid) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT s.id, s.provider_id, s.category_id, s.name, s.description, s.price,
                   s.image, s.location, s.is_available, s.availability_type,
                   s.experience_years, s.total_bookings, s.created_at, s.updated_at
            FROM favorite_services f
            JOIN services s ON s.id = f.service_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_service_packages(
        &self,
        service_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<ServicePackage>, sqlx::Error> {
        sqlx::query_as::<_, ServicePackage>(
            r#"
            SELECT id, service_id, name, description, price, duration_hours, features,
                   is_popular, is_active, created_at, updated_at
            FROM service_packages
            WHERE service_id = $1 AND (is_active = TRUE OR $2)
            ORDER BY price ASC
            "#,
        )
        .bind(service_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_package(&self, package_id: Uuid) -> Result<Option<ServicePackage>, sqlx::Error> {
        sqlx::query_as::<_, ServicePackage>(
            r#"
            SELECT id, service_id, name, description, price, duration_hours, features,
                   is_popular, is_active, created_at, updated_at
            FROM service_packages
            WHERE id = $1
            "#,
        )
        .bind(package_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_package(
        &self,
        service_id: Uuid,
        package: NewPackage,
    ) -> Result<ServicePackage, sqlx::Error> {
        sqlx::query_as::<_, ServicePackage>(
            r#"
            INSERT INTO service_packages (service_id, name, description, price,
                                          duration_hours, features, is_popular)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, service_id, name, description, price, duration_hours, features,
                      is_popular, is_active, created_at, updated_at
            "#,
        )
        .bind(service_id)
        .bind(package.name)
        .bind(package.description)
        .bind(package.price)
        .bind(package.duration_hours)
        .bind(Json(package.features))
        .bind(package.is_popular)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_package(
        &self,
        package_id: Uuid,
        changes: PackageChanges,
    ) -> Result<ServicePackage, sqlx::Error> {
        sqlx::query_as::<_, ServicePackage>(
            r#"
            UPDATE service_packages
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                duration_hours = COALESCE($5, duration_hours),
                features = COALESCE($6, features),
                is_popular = COALESCE($7, is_popular),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, service_id, name, description, price, duration_hours, features,
                      is_popular, is_active, created_at, updated_at
            "#,
        )
        .bind(package_id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.duration_hours)
        .bind(changes.features.map(Json))
        .bind(changes.is_popular)
        .bind(changes.is_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_package(&self, package_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM service_packages WHERE id = $1")
            .bind(package_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_active_promotions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>, sqlx::Error> {
        sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, title, description, discount_type, discount_value, applicable_to,
                   category_id, service_id, provider_id, start_date, end_date,
                   usage_limit, usage_count, is_active, promo_code, created_at, updated_at
            FROM promotions
            WHERE is_active = TRUE
              AND start_date <= $1 AND end_date >= $1
              AND (usage_limit IS NULL OR usage_count < usage_limit)
            ORDER BY end_date ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_promotion_by_code(&self, code: &str) -> Result<Option<Promotion>, sqlx::Error> {
        sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, title, description, discount_type, discount_value, applicable_to,
                   category_id, service_id, provider_id, start_date, end_date,
                   usage_limit, usage_count, is_active, promo_code, created_at, updated_at
            FROM promotions
            WHERE promo_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }
}
