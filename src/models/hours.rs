use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::services::availability::WEEKDAY_KEYS;
use crate::services::timeslot::TimeOfDay;

/// One weekday's entry in the organization's operating-hours table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    pub open: Option<TimeOfDay>,
    pub close: Option<TimeOfDay>,
    #[serde(default)]
    pub closed: bool,
}

/// Weekday-keyed operating hours, stored as JSON on the organization row.
/// Keys are the canonical English weekday names ("monday".."sunday").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatingHours {
    pub days: BTreeMap<String, DayHours>,
}

impl OperatingHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: OperatingHours = serde_json::from_str(s)?;
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (day, entry) in &self.days {
            if !WEEKDAY_KEYS.contains(&day.as_str()) {
                anyhow::bail!("invalid weekday key: {day}");
            }
            if !entry.closed {
                let (open, close) = match (entry.open, entry.close) {
                    (Some(o), Some(c)) => (o, c),
                    _ => anyhow::bail!("{day}: open and close are required unless closed"),
                };
                if open >= close {
                    anyhow::bail!("{day}: open must be before close");
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self.days)?)
    }

    pub fn day(&self, key: &str) -> Option<&DayHours> {
        self.days.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"monday":{"open":"08:00","close":"18:00"},"sunday":{"closed":true,"open":null,"close":null}}"#;
        let hours = OperatingHours::from_json(json).unwrap();
        assert_eq!(hours.days.len(), 2);
        assert!(!hours.day("monday").unwrap().closed);
        assert!(hours.day("sunday").unwrap().closed);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(OperatingHours::from_json("not json").is_err());
    }

    #[test]
    fn test_parse_invalid_weekday_key() {
        let json = r#"{"lundi":{"open":"08:00","close":"18:00"}}"#;
        assert!(OperatingHours::from_json(json).is_err());
    }

    #[test]
    fn test_open_day_requires_bounds() {
        let json = r#"{"monday":{"open":"08:00","close":null}}"#;
        assert!(OperatingHours::from_json(json).is_err());
    }

    #[test]
    fn test_open_must_precede_close() {
        let json = r#"{"monday":{"open":"18:00","close":"08:00"}}"#;
        assert!(OperatingHours::from_json(json).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let json = r#"{"monday":{"open":"08:00","close":"18:00","closed":false}}"#;
        let hours = OperatingHours::from_json(json).unwrap();
        let back = OperatingHours::from_json(&hours.to_json().unwrap()).unwrap();
        assert_eq!(back.days.len(), 1);
    }
}
