// models/schedulemodel.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Name of a weekday numbered from Monday = 0.
pub fn day_name(day_of_week: i16) -> Option<&'static str> {
    usize::try_from(day_of_week)
        .ok()
        .and_then(|day| DAY_NAMES.get(day).copied())
}

/// A provider's working hours for one weekday, or for one specific date
/// when `date_override` is set.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ProviderSchedule {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub date_override: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderSchedule {
    pub fn day_name(&self) -> &'static str {
        day_name(self.day_of_week).unwrap_or("Unknown")
    }

    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self.date_override {
            Some(override_date) => override_date == date,
            None => {
                let weekday = date.weekday().num_days_from_monday();
                u32::try_from(self.day_of_week).ok() == Some(weekday)
            }
        }
    }
}

/// Entries that govern `date`. A date override replaces the weekly entry
/// for that weekday.
pub fn entries_for_date(entries: &[ProviderSchedule], date: NaiveDate) -> Vec<&ProviderSchedule> {
    let overrides: Vec<&ProviderSchedule> = entries
        .iter()
        .filter(|entry| entry.date_override == Some(date))
        .collect();
    if !overrides.is_empty() {
        return overrides;
    }

    entries
        .iter()
        .filter(|entry| entry.date_override.is_none() && entry.applies_on(date))
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn entry(day_of_week: i16, start: (u32, u32), end: (u32, u32)) -> ProviderSchedule {
        let now = Utc::now();
        ProviderSchedule {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            day_of_week,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            is_available: true,
            date_override: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::entry;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn days_are_numbered_from_monday() {
        assert_eq!(day_name(0), Some("Monday"));
        assert_eq!(day_name(6), Some("Sunday"));
        assert_eq!(day_name(7), None);
        assert_eq!(day_name(-1), None);
        assert_eq!(entry(4, (9, 0), (17, 0)).day_name(), "Friday");
    }

    #[test]
    fn weekly_entry_applies_on_its_weekday() {
        let wednesday = entry(2, (9, 0), (17, 0));
        // 2024-01-03 was a Wednesday.
        assert!(wednesday.applies_on(date(2024, 1, 3)));
        assert!(wednesday.applies_on(date(2024, 1, 10)));
        assert!(!wednesday.applies_on(date(2024, 1, 4)));
    }

    #[test]
    fn override_applies_only_on_its_date() {
        let mut holiday = entry(2, (10, 0), (12, 0));
        holiday.date_override = Some(date(2024, 1, 3));
        assert!(holiday.applies_on(date(2024, 1, 3)));
        assert!(!holiday.applies_on(date(2024, 1, 10)));
    }

    #[test]
    fn override_replaces_weekly_hours() {
        let weekly = entry(2, (9, 0), (17, 0));
        let mut short_day = entry(2, (10, 0), (12, 0));
        short_day.date_override = Some(date(2024, 1, 3));
        let entries = vec![weekly.clone(), short_day.clone()];

        let on_override = entries_for_date(&entries, date(2024, 1, 3));
        assert_eq!(on_override.len(), 1);
        assert_eq!(on_override[0].id, short_day.id);

        let next_week = entries_for_date(&entries, date(2024, 1, 10));
        assert_eq!(next_week.len(), 1);
        assert_eq!(next_week[0].id, weekly.id);

        assert!(entries_for_date(&entries, date(2024, 1, 4)).is_empty());
    }
}
