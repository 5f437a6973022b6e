use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::errors::ScheduleError;
use crate::models::OperatingHours;
use crate::services::timeslot::TimeOfDay;

/// Canonical weekday keys used by the operating-hours storage, Monday first.
pub const WEEKDAY_KEYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// French labels for the dashboard UI, keyed by the canonical English keys.
/// An explicit table: a missing entry here would silently mislabel a day,
/// so the tests assert all 7.
pub const DAY_LABELS_FR: [(&str, &str); 7] = [
    ("monday", "Lundi"),
    ("tuesday", "Mardi"),
    ("wednesday", "Mercredi"),
    ("thursday", "Jeudi"),
    ("friday", "Vendredi"),
    ("saturday", "Samedi"),
    ("sunday", "Dimanche"),
];

/// Maps a calendar date to its storage key. An explicit lookup rather than a
/// string derivation so locale settings can never change the key.
pub fn weekday_key(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub fn day_label_fr(key: &str) -> Option<&'static str> {
    DAY_LABELS_FR
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub open: bool,
    pub open_time: Option<TimeOfDay>,
    pub close_time: Option<TimeOfDay>,
}

impl DayAvailability {
    fn closed() -> Self {
        DayAvailability {
            open: false,
            open_time: None,
            close_time: None,
        }
    }
}

/// Whether the organization is open on `date`, and the bounds if so.
/// A missing day entry counts as closed.
pub fn is_open_on(hours: &OperatingHours, date: NaiveDate) -> DayAvailability {
    let entry = match hours.day(weekday_key(date)) {
        Some(e) => e,
        None => return DayAvailability::closed(),
    };
    if entry.closed {
        return DayAvailability::closed();
    }
    match (entry.open, entry.close) {
        (Some(open), Some(close)) => DayAvailability {
            open: true,
            open_time: Some(open),
            close_time: Some(close),
        },
        _ => DayAvailability::closed(),
    }
}

/// Earliest open hour and latest close hour across the week (integer hour
/// truncation), used to size the timetable grid. Falls back to 8..19 when
/// no hours are configured, 8..21 when configured but no day is open, so
/// the grid never collapses.
pub fn timetable_range(hours: &OperatingHours) -> (u32, u32) {
    if hours.is_empty() {
        return (8, 19);
    }

    let mut start: Option<u32> = None;
    let mut end: Option<u32> = None;
    for entry in hours.days.values() {
        if entry.closed {
            continue;
        }
        if let (Some(open), Some(close)) = (entry.open, entry.close) {
            start = Some(start.map_or(open.hour(), |s| s.min(open.hour())));
            end = Some(end.map_or(close.hour(), |e| e.max(close.hour())));
        }
    }

    match (start, end) {
        (Some(s), Some(e)) => (s, e),
        _ => (8, 21),
    }
}

/// The single gate every booking-creation and reschedule path passes before
/// touching persisted state. Absent or empty hours fall back to permissive:
/// only the interval itself is checked.
pub fn validate_window(
    hours: Option<&OperatingHours>,
    date: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
) -> Result<(), ScheduleError> {
    if end <= start {
        return Err(ScheduleError::InvalidRange);
    }

    let hours = match hours {
        Some(h) if !h.is_empty() => h,
        _ => return Ok(()),
    };

    let day = is_open_on(hours, date);
    if !day.open {
        return Err(ScheduleError::ClosedDay {
            day: weekday_key(date).to_string(),
        });
    }

    // Bounds are present whenever the day is open.
    let (open, close) = match (day.open_time, day.close_time) {
        (Some(o), Some(c)) => (o, c),
        _ => return Ok(()),
    };

    if start < open || end > close {
        return Err(ScheduleError::OutOfHours {
            open: open.to_string(),
            close: close.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weekday_hours() -> OperatingHours {
        OperatingHours::from_json(
            r#"{
                "monday": {"open":"08:00","close":"18:00"},
                "tuesday": {"open":"09:00","close":"17:00"},
                "saturday": {"open":"10:00","close":"12:30"},
                "sunday": {"closed":true,"open":null,"close":null}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_weekday_key_covers_the_week() {
        // 2025-06-16 is a Monday; walk the whole week
        let monday = d("2025-06-16");
        let keys: Vec<_> = (0..7)
            .map(|i| weekday_key(monday + chrono::Duration::days(i)))
            .collect();
        assert_eq!(keys, WEEKDAY_KEYS);
    }

    #[test]
    fn test_day_labels_fr_all_seven() {
        for key in WEEKDAY_KEYS {
            assert!(day_label_fr(key).is_some(), "missing label for {key}");
        }
        assert_eq!(day_label_fr("monday"), Some("Lundi"));
        assert_eq!(day_label_fr("sunday"), Some("Dimanche"));
        assert_eq!(day_label_fr("mon"), None);
    }

    #[test]
    fn test_is_open_on_open_day() {
        let day = is_open_on(&weekday_hours(), d("2025-06-16"));
        assert!(day.open);
        assert_eq!(day.open_time, Some(t("08:00")));
        assert_eq!(day.close_time, Some(t("18:00")));
    }

    #[test]
    fn test_is_open_on_explicitly_closed_day() {
        // 2025-06-22 is a Sunday
        let day = is_open_on(&weekday_hours(), d("2025-06-22"));
        assert!(!day.open);
        assert!(day.open_time.is_none());
    }

    #[test]
    fn test_is_open_on_missing_day_is_closed() {
        // 2025-06-18 is a Wednesday, absent from the table
        let day = is_open_on(&weekday_hours(), d("2025-06-18"));
        assert!(!day.open);
    }

    #[test]
    fn test_timetable_range_scans_week() {
        assert_eq!(timetable_range(&weekday_hours()), (8, 18));
    }

    #[test]
    fn test_timetable_range_empty_default() {
        assert_eq!(timetable_range(&OperatingHours::default()), (8, 19));
    }

    #[test]
    fn test_timetable_range_all_closed_default() {
        let hours =
            OperatingHours::from_json(r#"{"sunday":{"closed":true,"open":null,"close":null}}"#)
                .unwrap();
        assert_eq!(timetable_range(&hours), (8, 21));
    }

    #[test]
    fn test_validate_window_inverted_range() {
        let hours = weekday_hours();
        let err = validate_window(Some(&hours), d("2025-06-16"), t("11:00"), t("10:00"));
        assert_eq!(err, Err(ScheduleError::InvalidRange));
        let err = validate_window(Some(&hours), d("2025-06-16"), t("10:00"), t("10:00"));
        assert_eq!(err, Err(ScheduleError::InvalidRange));
    }

    #[test]
    fn test_validate_window_closed_day() {
        let hours = OperatingHours::from_json(
            r#"{"sunday":{"closed":true,"open":null,"close":null}}"#,
        )
        .unwrap();
        // 2025-06-22 is a Sunday
        let err = validate_window(Some(&hours), d("2025-06-22"), t("10:00"), t("11:00"));
        assert_eq!(
            err,
            Err(ScheduleError::ClosedDay {
                day: "sunday".to_string()
            })
        );
    }

    #[test]
    fn test_validate_window_out_of_hours() {
        let hours =
            OperatingHours::from_json(r#"{"monday":{"open":"08:00","close":"18:00"}}"#).unwrap();
        let err = validate_window(Some(&hours), d("2025-06-16"), t("07:00"), t("09:00"));
        assert_eq!(
            err,
            Err(ScheduleError::OutOfHours {
                open: "08:00".to_string(),
                close: "18:00".to_string()
            })
        );
        let err = validate_window(Some(&hours), d("2025-06-16"), t("17:00"), t("18:30"));
        assert!(matches!(err, Err(ScheduleError::OutOfHours { .. })));
    }

    #[test]
    fn test_validate_window_boundary_inclusive() {
        let hours =
            OperatingHours::from_json(r#"{"monday":{"open":"08:00","close":"18:00"}}"#).unwrap();
        assert!(validate_window(Some(&hours), d("2025-06-16"), t("08:00"), t("18:00")).is_ok());
    }

    #[test]
    fn test_validate_window_permissive_without_hours() {
        // No hours at all: anything in-range passes, even a Sunday night
        assert!(validate_window(None, d("2025-06-22"), t("22:00"), t("23:00")).is_ok());
        let empty = OperatingHours::default();
        assert!(validate_window(Some(&empty), d("2025-06-22"), t("22:00"), t("23:00")).is_ok());
        // The interval itself is still checked
        assert_eq!(
            validate_window(None, d("2025-06-22"), t("23:00"), t("22:00")),
            Err(ScheduleError::InvalidRange)
        );
    }
}
