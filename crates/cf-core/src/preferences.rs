//! User preferences consumed by the engine.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::sensitivity::SensitivityPreference;
use crate::types::ValidationError;

/// Default daily caffeine limit in mg.
pub const DEFAULT_DAILY_LIMIT_MG: u32 = 400;

/// Bedtime, daily limit and sensitivity override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(with = "time_of_day")]
    pub bedtime: NaiveTime,
    pub daily_limit_mg: u32,
    pub sensitivity: SensitivityPreference,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            bedtime: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
            daily_limit_mg: DEFAULT_DAILY_LIMIT_MG,
            sensitivity: SensitivityPreference::Auto,
        }
    }
}

/// Parses an `HH:MM` time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| ValidationError::InvalidTimeOfDay {
        value: s.to_string(),
    })
}

/// Formats a time of day as `HH:MM`.
pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_time_of_day(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let prefs = Preferences::default();
        assert_eq!(format_time_of_day(prefs.bedtime), "23:00");
        assert_eq!(prefs.daily_limit_mg, 400);
        assert_eq!(prefs.sensitivity, SensitivityPreference::Auto);
    }

    #[test]
    fn parses_time_of_day() {
        assert_eq!(
            parse_time_of_day("22:30").unwrap(),
            NaiveTime::from_hms_opt(22, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day(" 07:05 ").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 0).unwrap()
        );
        assert!(parse_time_of_day("24:00").is_err());
        assert!(parse_time_of_day("late").is_err());
    }

    #[test]
    fn serializes_bedtime_as_hh_mm() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["bedtime"], "23:00");
        assert_eq!(json["sensitivity"], "auto");

        let back: Preferences = serde_json::from_value(json).unwrap();
        assert_eq!(back, Preferences::default());
    }
}
