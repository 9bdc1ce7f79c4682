//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An hour-of-day value outside 0-23.
    #[error("hour must be between 0 and 23, got {value}")]
    HourOutOfRange { value: u32 },

    /// A caffeine amount that is negative or not a finite number.
    #[error("caffeine amount must be a finite, non-negative number of mg, got {value}")]
    InvalidAmount { value: f64 },

    /// Invalid sleep quality value.
    #[error("invalid sleep quality: {value} (expected poor, ok or great)")]
    InvalidSleepQuality { value: String },

    /// Invalid sensitivity preference value.
    #[error("invalid sensitivity: {value} (expected auto, low, moderate or high)")]
    InvalidSensitivity { value: String },

    /// Unknown badge identifier.
    #[error("unknown badge: {value}")]
    UnknownBadge { value: String },

    /// A time of day that is not `HH:MM`.
    #[error("invalid time of day: {value} (expected HH:MM)")]
    InvalidTimeOfDay { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated consumption event identifier.
    ///
    /// Uniqueness is enforced by the event store, not here.
    EventId, "event ID"
);

define_string_id!(
    /// A validated substance identifier.
    ///
    /// Catalog drinks use their catalog ID (e.g. `espresso`); anything else is
    /// a manual entry.
    SubstanceId, "substance ID"
);

/// Self-reported sleep quality for one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Ok,
    Great,
}

impl SleepQuality {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Ok => "ok",
            Self::Great => "great",
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SleepQuality {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "poor" => Ok(Self::Poor),
            "ok" => Ok(Self::Ok),
            "great" => Ok(Self::Great),
            _ => Err(ValidationError::InvalidSleepQuality {
                value: s.to_string(),
            }),
        }
    }
}

/// Validates an hour-of-day value.
pub fn check_hour(hour: u32) -> Result<u8, ValidationError> {
    u8::try_from(hour)
        .ok()
        .filter(|h| *h <= 23)
        .ok_or(ValidationError::HourOutOfRange { value: hour })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_rejects_empty() {
        assert!(EventId::new("").is_err());
        assert!(EventId::new("   ").is_err());
        assert!(EventId::new("dose-1").is_ok());
    }

    #[test]
    fn substance_id_serde_rejects_empty() {
        let result: Result<SubstanceId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());

        let parsed: SubstanceId = serde_json::from_str("\"espresso\"").unwrap();
        assert_eq!(parsed.as_str(), "espresso");
    }

    #[test]
    fn sleep_quality_from_str() {
        assert_eq!("poor".parse::<SleepQuality>().unwrap(), SleepQuality::Poor);
        assert_eq!("ok".parse::<SleepQuality>().unwrap(), SleepQuality::Ok);
        assert_eq!("great".parse::<SleepQuality>().unwrap(), SleepQuality::Great);
        assert!("meh".parse::<SleepQuality>().is_err());
    }

    #[test]
    fn sleep_quality_serializes_lowercase() {
        let json = serde_json::to_string(&SleepQuality::Great).unwrap();
        assert_eq!(json, "\"great\"");
    }

    #[test]
    fn check_hour_bounds() {
        assert_eq!(check_hour(0), Ok(0));
        assert_eq!(check_hour(23), Ok(23));
        assert_eq!(
            check_hour(24),
            Err(ValidationError::HourOutOfRange { value: 24 })
        );
    }
}
