use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Wall-clock time of day, stored as minutes since midnight.
/// Parses and serializes as "HH:MM"; ordering is plain integer ordering so
/// interval comparisons never go through string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(TimeOfDay((hour * 60 + minute) as u16))
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
        let hour: u32 = h.parse().map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
        let minute: u32 = m
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
        TimeOfDay::new(hour, minute).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes >= 24 * 60 {
            return None;
        }
        Some(TimeOfDay(minutes))
    }

    pub fn hour(&self) -> u32 {
        (self.0 / 60) as u32
    }

    pub fn minute(&self) -> u32 {
        (self.0 % 60) as u32
    }

    pub fn as_minutes(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        TimeOfDay::parse(&s).map_err(|e| e.to_string())
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> String {
        t.to_string()
    }
}

/// Duration of `[start, end)` in fractional hours (e.g. 90 minutes = 1.5).
/// Negative when the interval is inverted; callers reject that first.
pub fn duration_hours(start: TimeOfDay, end: TimeOfDay) -> Decimal {
    let minutes = end.as_minutes() as i64 - start.as_minutes() as i64;
    Decimal::from(minutes) / Decimal::from(60)
}

/// Half-open interval overlap: `[s1, e1)` and `[s2, e2)` overlap iff
/// `s1 < e2 && e1 > s2`. Touching endpoints do not overlap.
pub fn overlaps(s1: TimeOfDay, e1: TimeOfDay, s2: TimeOfDay, e2: TimeOfDay) -> bool {
    s1 < e2 && e1 > s2
}

/// Monday..Sunday of the week containing `date`, for the weekly timetable.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_format() {
        assert_eq!(t("09:00").to_string(), "09:00");
        assert_eq!(t("00:00").as_minutes(), 0);
        assert_eq!(t("23:59").as_minutes(), 23 * 60 + 59);
        assert_eq!(t("14:30").hour(), 14);
        assert_eq!(t("14:30").minute(), 30);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
        assert!(TimeOfDay::parse("noon").is_err());
        assert!(TimeOfDay::parse("12").is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(t("08:00") < t("08:01"));
        assert!(t("10:00") < t("18:00"));
        assert_eq!(t("09:30"), t("09:30"));
    }

    #[test]
    fn test_duration_hours_fractional() {
        assert_eq!(duration_hours(t("09:00"), t("11:30")), Decimal::new(25, 1));
        assert_eq!(duration_hours(t("09:00"), t("10:00")), Decimal::from(1));
        assert!(duration_hours(t("10:00"), t("09:00")) < Decimal::ZERO);
    }

    #[test]
    fn test_overlaps_half_open() {
        // [09:00,10:00) vs [10:00,11:00): touching, no overlap
        assert!(!overlaps(t("09:00"), t("10:00"), t("10:00"), t("11:00")));
        assert!(!overlaps(t("10:00"), t("11:00"), t("09:00"), t("10:00")));
        // Partial overlap both directions
        assert!(overlaps(t("09:00"), t("10:30"), t("10:00"), t("11:00")));
        assert!(overlaps(t("10:00"), t("11:00"), t("09:00"), t("10:30")));
        // Containment
        assert!(overlaps(t("09:00"), t("12:00"), t("10:00"), t("11:00")));
    }

    #[test]
    fn test_week_bounds() {
        // 2025-06-18 is a Wednesday
        let (monday, sunday) = week_bounds(NaiveDate::from_ymd_opt(2025, 6, 18).unwrap());
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 6, 16).unwrap());
        assert_eq!(sunday, NaiveDate::from_ymd_opt(2025, 6, 22).unwrap());
        // A Monday maps to itself
        let (monday2, _) = week_bounds(monday);
        assert_eq!(monday2, monday);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&t("09:15")).unwrap();
        assert_eq!(json, "\"09:15\"");
        let back: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t("09:15"));
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }
}
