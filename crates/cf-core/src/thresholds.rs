//! Classifier thresholds.
//!
//! Every classifier receives these explicitly; nothing reads a global.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decay::{DEFAULT_HALF_LIFE_HOURS, DecayParameters, hours_to_reach};
use crate::sensitivity::SensitivityLevel;
use crate::status::SleepRisk;

/// Shortest wait reported while jitter risk is active.
const MIN_WAIT_HOURS: f64 = 1.0 / 60.0;

/// Invalid threshold configuration.
///
/// These are caller mistakes, reported once at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("half_life_hours must be a positive number, got {value}")]
    InvalidHalfLife { value: f64 },

    #[error("{field} must be a positive number of mg, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("sleep_safe_mg ({safe}) must be below sleep_caution_mg ({caution})")]
    SleepThresholdsMisordered { safe: f64, caution: f64 },

    #[error("next_dose_estimate_mg ({next_dose}) must be below jitter_threshold_mg ({jitter})")]
    JitterThresholdsMisordered { next_dose: f64, jitter: f64 },

    #[error("pattern window must cover at least one day")]
    EmptyWindow,
}

/// Ceilings used by the status, guidance and sleep classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub half_life_hours: f64,
    /// Projected bedtime level below which sleep risk is low.
    pub sleep_safe_mg: f64,
    /// Projected bedtime level below which sleep risk is medium.
    pub sleep_caution_mg: f64,
    /// Stacking ceiling for short-term overstimulation.
    pub jitter_threshold_mg: f64,
    /// Size of the dose the user is assumed to be considering.
    pub next_dose_estimate_mg: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            half_life_hours: DEFAULT_HALF_LIFE_HOURS,
            sleep_safe_mg: 50.0,
            sleep_caution_mg: 100.0,
            jitter_threshold_mg: 300.0,
            next_dose_estimate_mg: 95.0, // one drip coffee
        }
    }
}

impl Thresholds {
    /// Checks the thresholds are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.half_life_hours.is_finite() && self.half_life_hours > 0.0) {
            return Err(ConfigError::InvalidHalfLife {
                value: self.half_life_hours,
            });
        }
        for (field, value) in [
            ("sleep_safe_mg", self.sleep_safe_mg),
            ("sleep_caution_mg", self.sleep_caution_mg),
            ("jitter_threshold_mg", self.jitter_threshold_mg),
            ("next_dose_estimate_mg", self.next_dose_estimate_mg),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.sleep_safe_mg >= self.sleep_caution_mg {
            return Err(ConfigError::SleepThresholdsMisordered {
                safe: self.sleep_safe_mg,
                caution: self.sleep_caution_mg,
            });
        }
        if self.next_dose_estimate_mg >= self.jitter_threshold_mg {
            return Err(ConfigError::JitterThresholdsMisordered {
                next_dose: self.next_dose_estimate_mg,
                jitter: self.jitter_threshold_mg,
            });
        }
        Ok(())
    }

    pub const fn decay(&self) -> DecayParameters {
        DecayParameters {
            half_life_hours: self.half_life_hours,
        }
    }

    /// Thresholds adjusted for a sensitivity tier.
    ///
    /// High sensitivity halves the sleep ceilings and lowers the jitter
    /// ceiling by a third; low sensitivity loosens both. Moderate and
    /// unknown keep the configured values.
    #[must_use]
    pub fn for_sensitivity(&self, level: SensitivityLevel) -> Self {
        match level {
            SensitivityLevel::High => self.scaled(0.5, 2.0 / 3.0),
            SensitivityLevel::Low => self.scaled(1.5, 4.0 / 3.0),
            SensitivityLevel::Moderate | SensitivityLevel::Unknown => *self,
        }
    }

    fn scaled(&self, sleep: f64, jitter: f64) -> Self {
        let scaled_jitter = (self.jitter_threshold_mg * jitter).round();
        Self {
            sleep_safe_mg: (self.sleep_safe_mg * sleep).round(),
            sleep_caution_mg: (self.sleep_caution_mg * sleep).round(),
            // The next dose must still fit under the ceiling.
            jitter_threshold_mg: if scaled_jitter > self.next_dose_estimate_mg {
                scaled_jitter
            } else {
                self.jitter_threshold_mg
            },
            ..*self
        }
    }

    /// Classifies a projected bedtime level.
    pub fn sleep_risk(&self, projected_mg: f64) -> SleepRisk {
        if projected_mg < self.sleep_safe_mg {
            SleepRisk::Low
        } else if projected_mg < self.sleep_caution_mg {
            SleepRisk::Medium
        } else {
            SleepRisk::High
        }
    }

    /// True when one more estimated dose would reach the jitter ceiling.
    pub fn jitter_active(&self, current_mg: f64) -> bool {
        current_mg + self.next_dose_estimate_mg >= self.jitter_threshold_mg
    }

    /// Hours until another estimated dose fits under the jitter ceiling.
    ///
    /// Levels are whole mg, so the wait runs until the level reads one mg
    /// below `jitter - next`, and is never shorter than a minute. `None` when
    /// a dose would already fit.
    pub fn jitter_wait_hours(&self, current_mg: f64) -> Option<f64> {
        self.jitter_active(current_mg).then(|| {
            hours_to_reach(
                current_mg,
                self.jitter_threshold_mg - self.next_dose_estimate_mg - 1.0,
                self.half_life_hours,
            )
            .max(MIN_WAIT_HOURS)
        })
    }

    /// Hours for a bedtime level to decay to the sleep-safe ceiling.
    pub fn sleep_clear_hours(&self, projected_mg: f64) -> f64 {
        hours_to_reach(projected_mg, self.sleep_safe_mg, self.half_life_hours)
    }
}
