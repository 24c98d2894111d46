// service/background_jobs.rs
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use tokio::time::{interval, Duration};

use crate::{
    db::{orderdb::OrderExt, servicedb::ServiceExt},
    service::{error::ServiceError, notification_service::reminder_notifications},
    AppState,
};

/// `[start, end)` of tomorrow's UTC date.
pub fn tomorrow_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tomorrow = now.date_naive() + ChronoDuration::days(1);
    let start = Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::default()));
    (start, start + ChronoDuration::days(1))
}

/// One reminder pass. Returns how many orders were reminded.
pub async fn send_reminder_notifications(app_state: &AppState) -> Result<usize, ServiceError> {
    let now = Utc::now();
    let (start, end) = tomorrow_window(now);
    let orders = app_state
        .db_client
        .get_orders_due_for_reminder(start, end)
        .await?;

    let mut reminded = 0;
    for order in orders {
        let Some(service) = app_state.db_client.get_service(order.service_id).await? else {
            tracing::warn!("order {} has no service, skipping reminder", order.id);
            continue;
        };

        app_state
            .notification_service
            .dispatch(reminder_notifications(&order, &service))
            .await;
        app_state.db_client.mark_reminder_sent(order.id, now).await?;
        reminded += 1;
    }

    Ok(reminded)
}

pub async fn start_reminder_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(app_state.env.reminder_interval_secs.max(1)));

    loop {
        interval.tick().await;

        tracing::info!("Running reminder job at {}", Utc::now());

        match send_reminder_notifications(&app_state).await {
            Ok(count) => tracing::info!("Reminder job completed: {} orders reminded", count),
            Err(e) => tracing::error!("Reminder job failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_covers_the_whole_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 22, 45, 0).unwrap();
        let (start, end) = tomorrow_window(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn window_rolls_over_month_end() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 1, 0, 0).unwrap();
        let (start, _) = tomorrow_window(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }
}
