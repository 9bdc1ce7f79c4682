//! Caffeine sensitivity inferred from sleep check-ins.
//!
//! Compares yesterday's caffeine on nights reported as "poor" against nights
//! reported as "great". A large gap means caffeine is costing the user sleep.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checkin::{SleepCheckin, unique_by_date};
use crate::types::{SleepQuality, ValidationError};

/// Check-ins needed before any inference is attempted.
pub const MIN_CHECKINS: usize = 5;

/// Poor-minus-great gap above which sensitivity is high.
const HIGH_GAP_MG: f64 = 150.0;

/// Poor-minus-great gap above which sensitivity is moderate.
const MODERATE_GAP_MG: f64 = 50.0;

/// How strongly caffeine appears to disrupt sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    Unknown,
    Low,
    Moderate,
    High,
}

impl SensitivityLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preference: let the engine decide, or pin a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityPreference {
    #[default]
    Auto,
    Low,
    Moderate,
    High,
}

impl SensitivityPreference {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// The pinned level, or `None` for `auto`.
    #[must_use]
    pub const fn override_level(&self) -> Option<SensitivityLevel> {
        match self {
            Self::Auto => None,
            Self::Low => Some(SensitivityLevel::Low),
            Self::Moderate => Some(SensitivityLevel::Moderate),
            Self::High => Some(SensitivityLevel::High),
        }
    }
}

impl fmt::Display for SensitivityPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SensitivityPreference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            _ => Err(ValidationError::InvalidSensitivity {
                value: s.to_string(),
            }),
        }
    }
}

/// Where the reported level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivitySource {
    Inferred,
    Override,
}

/// Outcome of sensitivity inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    /// Level to act on (the override when one is set).
    pub level: SensitivityLevel,
    /// Statistical estimate, computed even when overridden.
    pub inferred: SensitivityLevel,
    pub source: SensitivitySource,
    pub description: String,
    /// Distinct check-in dates considered.
    pub checkins_counted: usize,
    /// Check-ins still missing before inference kicks in.
    pub checkins_needed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poor_night_avg_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub great_night_avg_mg: Option<f64>,
}

/// Infers caffeine sensitivity from sleep check-ins.
///
/// # Rules
///
/// 1. Fewer than [`MIN_CHECKINS`] distinct dates: `unknown`
/// 2. Neither "great" nor "poor" nights: `moderate`
/// 3. No "poor" nights: `low`; no "great" nights: `high`
/// 4. Otherwise on the poor-minus-great gap in yesterday's caffeine:
///    `> 150 mg` high, `> 50 mg` moderate, else low
///
/// An explicit preference replaces the reported level and description, but
/// the inferred level is still returned alongside it.
pub fn infer_sensitivity(
    checkins: &[SleepCheckin],
    preference: SensitivityPreference,
) -> SensitivityResult {
    let unique = unique_by_date(checkins);
    let counted = unique.len();
    let needed = MIN_CHECKINS.saturating_sub(counted);

    let poor_avg = average_mg(&unique, SleepQuality::Poor);
    let great_avg = average_mg(&unique, SleepQuality::Great);

    let inferred = if needed > 0 {
        SensitivityLevel::Unknown
    } else {
        match (poor_avg, great_avg) {
            (None, None) => SensitivityLevel::Moderate,
            (None, Some(_)) => SensitivityLevel::Low,
            (Some(_), None) => SensitivityLevel::High,
            (Some(poor), Some(great)) => {
                let gap = poor - great;
                if gap > HIGH_GAP_MG {
                    SensitivityLevel::High
                } else if gap > MODERATE_GAP_MG {
                    SensitivityLevel::Moderate
                } else {
                    SensitivityLevel::Low
                }
            }
        }
    };

    tracing::debug!(
        counted,
        needed,
        ?poor_avg,
        ?great_avg,
        inferred = %inferred,
        preference = %preference,
        "inferred sensitivity"
    );

    let (level, source, description) = match preference.override_level() {
        Some(level) => (
            level,
            SensitivitySource::Override,
            override_description(level).to_string(),
        ),
        None => (
            inferred,
            SensitivitySource::Inferred,
            inferred_description(inferred, needed),
        ),
    };

    SensitivityResult {
        level,
        inferred,
        source,
        description,
        checkins_counted: counted,
        checkins_needed: needed,
        poor_night_avg_mg: poor_avg,
        great_night_avg_mg: great_avg,
    }
}

#[allow(clippy::cast_precision_loss)]
fn average_mg(checkins: &[&SleepCheckin], quality: SleepQuality) -> Option<f64> {
    let amounts: Vec<f64> = checkins
        .iter()
        .filter(|c| c.quality == quality)
        .map(|c| c.yesterday_caffeine_mg)
        .collect();
    if amounts.is_empty() {
        return None;
    }
    Some(amounts.iter().sum::<f64>() / amounts.len() as f64)
}

fn inferred_description(level: SensitivityLevel, needed: usize) -> String {
    match level {
        SensitivityLevel::Unknown => {
            let plural = if needed == 1 { "" } else { "s" };
            format!("Need {needed} more sleep check-in{plural} to estimate your sensitivity.")
        }
        SensitivityLevel::Low => {
            "Your sleep doesn't seem to track how much caffeine you have.".to_string()
        }
        SensitivityLevel::Moderate => {
            "Higher-caffeine days tend to come before rougher nights.".to_string()
        }
        SensitivityLevel::High => {
            "Caffeine clearly costs you sleep. Keep afternoon doses light.".to_string()
        }
    }
}

const fn override_description(level: SensitivityLevel) -> &'static str {
    match level {
        SensitivityLevel::Low => "You've set your sensitivity to low.",
        SensitivityLevel::Moderate => "You've set your sensitivity to moderate.",
        SensitivityLevel::High => "You've set your sensitivity to high.",
        SensitivityLevel::Unknown => "Sensitivity not set.",
    }
}
