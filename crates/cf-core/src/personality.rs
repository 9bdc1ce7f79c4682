//! Consumption personality and intake level.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{DoseEvent, sorted_doses};
use crate::pattern::ConsumptionPattern;

/// One-word summary of a user's caffeine habits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonalityTag {
    EarlyBird,
    PowerDrinker,
    NightOwl,
    WeekendWarrior,
    SteadySipper,
}

impl PersonalityTag {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EarlyBird => "early-bird",
            Self::PowerDrinker => "power-drinker",
            Self::NightOwl => "night-owl",
            Self::WeekendWarrior => "weekend-warrior",
            Self::SteadySipper => "steady-sipper",
        }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::EarlyBird => "Early Bird",
            Self::PowerDrinker => "Power Drinker",
            Self::NightOwl => "Night Owl",
            Self::WeekendWarrior => "Weekend Warrior",
            Self::SteadySipper => "Steady Sipper",
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::EarlyBird => "You front-load your caffeine and are done well before the afternoon.",
            Self::PowerDrinker => "You run on a lot of caffeine. Watch how it stacks.",
            Self::NightOwl => "Your caffeine runs late into the day.",
            Self::WeekendWarrior => "Your weekends look very different from your weekdays.",
            Self::SteadySipper => "Consistent, moderate and predictable.",
        }
    }
}

impl fmt::Display for PersonalityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Picks the first matching personality, in priority order:
///
/// | tag             | rule                                         |
/// |-----------------|----------------------------------------------|
/// | early-bird      | first dose before 07:00 and > 80 % optimal   |
/// | power-drinker   | > 300 mg per day                             |
/// | night-owl       | last dose after 16:00 or < 50 % optimal      |
/// | weekend-warrior | weekend/weekday gap over 100 mg              |
/// | steady-sipper   | otherwise, and for an empty log              |
pub fn classify_personality<E: DoseEvent>(
    pattern: &ConsumptionPattern,
    events: &[E],
) -> PersonalityTag {
    if pattern.is_baseline || sorted_doses(events).is_empty() {
        return PersonalityTag::SteadySipper;
    }

    let tag = if pattern.avg_first_dose_hour < 7.0 && pattern.optimal_timing_pct > 80.0 {
        PersonalityTag::EarlyBird
    } else if pattern.avg_daily_mg > 300.0 {
        PersonalityTag::PowerDrinker
    } else if pattern.avg_last_dose_hour > 16.0 || pattern.optimal_timing_pct < 50.0 {
        PersonalityTag::NightOwl
    } else if pattern.weekend_delta_mg.abs() > 100.0 {
        PersonalityTag::WeekendWarrior
    } else {
        PersonalityTag::SteadySipper
    };

    tracing::debug!(tag = %tag, "classified personality");
    tag
}

/// Coarse daily intake band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionLevel {
    Light,
    Moderate,
    Heavy,
}

impl ConsumptionLevel {
    /// Light below 100 mg a day, moderate below 300, heavy otherwise.
    pub fn from_daily_mg(avg_daily_mg: f64) -> Self {
        if avg_daily_mg < 100.0 {
            Self::Light
        } else if avg_daily_mg < 300.0 {
            Self::Moderate
        } else {
            Self::Heavy
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
        }
    }
}

impl fmt::Display for ConsumptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
