// db/scheduledb.rs
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::schedulemodel::ProviderSchedule;

#[derive(Debug, Clone)]
pub struct NewScheduleEntry {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub date_override: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleChanges {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_available: Option<bool>,
}

#[async_trait]
pub trait ScheduleExt {
    async fn get_provider_schedule(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ProviderSchedule>, sqlx::Error>;

    async fn get_schedule_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<ProviderSchedule>, sqlx::Error>;

    async fn create_schedule_entry(
        &self,
        provider_id: Uuid,
        entry: NewScheduleEntry,
    ) -> Result<ProviderSchedule, sqlx::Error>;

    async fn update_schedule_entry(
        &self,
        entry_id: Uuid,
        changes: ScheduleChanges,
    ) -> Result<ProviderSchedule, sqlx::Error>;

    async fn delete_schedule_entry(&self, entry_id: Uuid) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl ScheduleExt for DBClient {
    async fn get_provider_schedule(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ProviderSchedule>, sqlx::Error> {
        sqlx::query_as::<_, ProviderSchedule>(
            r#"
            SELECT id, provider_id, day_of_week, start_time, end_time, is_available,
                   date_override, created_at, updated_at
            FROM provider_schedules
            WHERE provider_id = $1
            ORDER BY day_of_week, start_time
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_schedule_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<ProviderSchedule>, sqlx::Error> {
        sqlx::query_as::<_, ProviderSchedule>(
            r#"
            SELECT id, provider_id, day_of_week, start_time, end_time, is_available,
                   date_override, created_at, updated_at
            FROM provider_schedules
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_schedule_entry(
        &self,
        provider_id: Uuid,
        entry: NewScheduleEntry,
    ) -> Result<ProviderSchedule, sqlx::Error> {
        sqlx::query_as::<_, ProviderSchedule>(
            r#"
            INSERT INTO provider_schedules (provider_id, day_of_week, start_time, end_time,
                                            is_available, date_override)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, provider_id, day_of_week, start_time, end_time, is_available,
                      date_override, created_at, updated_at
            "#,
        )
        .bind(provider_id)
        .bind(entry.day_of_week)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(entry.is_available)
        .bind(entry.date_override)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_schedule_entry(
        &self,
        entry_id: Uuid,
        changes: ScheduleChanges,
    ) -> Result<ProviderSchedule, sqlx::Error> {
        sqlx::query_as::<_, ProviderSchedule>(
            r#"
            UPDATE provider_schedules
            SET start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                is_available = COALESCE($4, is_available),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, provider_id, day_of_week, start_time, end_time, is_available,
                      date_override, created_at, updated_at
            "#,
        )
        .bind(entry_id)
        .bind(changes.start_time)
        .bind(changes.end_time)
        .bind(changes.is_available)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_schedule_entry(&self, entry_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM provider_schedules WHERE id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
