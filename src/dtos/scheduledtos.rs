use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::db::scheduledb::{NewScheduleEntry, ScheduleChanges};
use crate::models::schedulemodel::ProviderSchedule;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[validate(schema(function = "validate_new_entry", skip_on_field_errors = false))]
pub struct CreateScheduleDto {
    #[validate(range(min = 0, max = 6, message = "Day of week must be between 0 (Monday) and 6"))]
    pub day_of_week: Option<i16>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub date_override: Option<NaiveDate>,
}

fn default_available() -> bool {
    true
}

fn validate_new_entry(dto: &CreateScheduleDto) -> Result<(), ValidationError> {
    if dto.day_of_week.is_none() && dto.date_override.is_none() {
        let mut error = ValidationError::new("missing_day");
        error.message = Some("Either a day of week or an override date is required".into());
        return Err(error);
    }
    check_slot(dto.start_time, dto.end_time)
}

/// Rejects slots that end at or before they start.
pub fn check_slot(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if start >= end {
        let mut error = ValidationError::new("invalid_slot");
        error.message = Some("Start time must be before end time".into());
        return Err(error);
    }
    Ok(())
}

impl From<CreateScheduleDto> for NewScheduleEntry {
    fn from(dto: CreateScheduleDto) -> Self {
        // An override date pins the weekday.
        let day_of_week = match dto.date_override {
            Some(date) => date.weekday().num_days_from_monday() as i16,
            None => dto.day_of_week.unwrap_or_default(),
        };
        NewScheduleEntry {
            day_of_week,
            start_time: dto.start_time,
            end_time: dto.end_time,
            is_available: dto.is_available,
            date_override: dto.date_override,
        }
    }
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleDto {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_available: Option<bool>,
}

impl UpdateScheduleDto {
    /// Ensures the slot stays well-formed once applied to `current`.
    pub fn check_against(&self, current: &ProviderSchedule) -> Result<(), ValidationError> {
        check_slot(
            self.start_time.unwrap_or(current.start_time),
            self.end_time.unwrap_or(current.end_time),
        )
    }
}

impl From<UpdateScheduleDto> for ScheduleChanges {
    fn from(dto: UpdateScheduleDto) -> Self {
        ScheduleChanges {
            start_time: dto.start_time,
            end_time: dto.end_time,
            is_available: dto.is_available,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleEntryDto {
    #[serde(flatten)]
    pub entry: ProviderSchedule,
    pub day_name: &'static str,
}

impl From<&ProviderSchedule> for ScheduleEntryDto {
    fn from(entry: &ProviderSchedule) -> Self {
        ScheduleEntryDto {
            day_name: entry.day_name(),
            entry: entry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedulemodel::fixtures;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn weekly(day: i16) -> CreateScheduleDto {
        CreateScheduleDto {
            day_of_week: Some(day),
            start_time: time(8, 0),
            end_time: time(17, 30),
            is_available: true,
            date_override: None,
        }
    }

    #[test]
    fn weekly_entry_validates() {
        assert!(weekly(0).validate().is_ok());
        assert!(weekly(6).validate().is_ok());

        let errors = weekly(7).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("day_of_week"));
    }

    #[test]
    fn slot_must_end_after_it_starts() {
        let mut dto = weekly(1);
        dto.end_time = dto.start_time;
        assert!(dto.validate().is_err());

        dto.end_time = time(7, 0);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn a_day_or_date_is_required() {
        let mut dto = weekly(1);
        dto.day_of_week = None;
        assert!(dto.validate().is_err());

        dto.date_override = NaiveDate::from_ymd_opt(2024, 1, 6);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn override_date_sets_the_weekday() {
        let mut dto = weekly(0);
        // 2024-01-06 was a Saturday.
        dto.date_override = NaiveDate::from_ymd_opt(2024, 1, 6);
        let entry: NewScheduleEntry = dto.into();
        assert_eq!(entry.day_of_week, 5);
    }

    #[test]
    fn update_is_checked_against_stored_hours() {
        let current = fixtures::entry(2, (9, 0), (17, 0));

        let later_start = UpdateScheduleDto {
            start_time: Some(time(12, 0)),
            ..Default::default()
        };
        assert!(later_start.check_against(&current).is_ok());

        let past_end = UpdateScheduleDto {
            start_time: Some(time(18, 0)),
            ..Default::default()
        };
        assert!(past_end.check_against(&current).is_err());
    }

    #[test]
    fn entry_dto_carries_day_name() {
        let entry = fixtures::entry(3, (9, 0), (17, 0));
        let json = serde_json::to_value(ScheduleEntryDto::from(&entry)).unwrap();
        assert_eq!(json["day_name"], "Thursday");
        assert_eq!(json["start_time"], "09:00:00");
    }
}
