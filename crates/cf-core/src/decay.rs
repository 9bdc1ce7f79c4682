//! Single-compartment exponential decay.
//!
//! Every dose decays independently: `mg × 0.5^(elapsed / half_life)`. Results
//! are rounded to whole milligrams so that levels shown to the user are stable
//! between ticks.

use serde::{Deserialize, Serialize};

/// Default caffeine half-life in hours.
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 5.0;

/// Below this the rounded level reads as zero.
const ROUNDS_TO_ZERO_MG: f64 = 0.5;

/// Decay model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayParameters {
    /// Time for half of a dose to be eliminated.
    pub half_life_hours: f64,
}

impl Default for DecayParameters {
    fn default() -> Self {
        Self {
            half_life_hours: DEFAULT_HALF_LIFE_HOURS,
        }
    }
}

impl DecayParameters {
    /// Caffeine remaining from `mg` after `elapsed_hours`.
    pub fn remaining(&self, mg: f64, elapsed_hours: f64) -> f64 {
        remaining(mg, elapsed_hours, self.half_life_hours)
    }

    /// Hours until a level of `mg` decays down to `target_mg`.
    pub fn hours_to_reach(&self, mg: f64, target_mg: f64) -> f64 {
        hours_to_reach(mg, target_mg, self.half_life_hours)
    }
}

/// Returns the caffeine remaining from a dose of `mg` after `elapsed_hours`.
///
/// * non-positive or non-finite `mg` yields `0`
/// * non-positive `elapsed_hours` returns `mg` unchanged (no decay into the past)
/// * otherwise the decayed amount rounded to the nearest whole mg
///
/// A non-positive half-life is a configuration error caught by
/// [`Thresholds::validate`](crate::Thresholds::validate); here it degrades to
/// "no decay" so the function stays total.
pub fn remaining(mg: f64, elapsed_hours: f64, half_life_hours: f64) -> f64 {
    if mg.is_nan() || mg <= 0.0 || mg.is_infinite() {
        return 0.0;
    }
    if elapsed_hours.is_nan() || elapsed_hours <= 0.0 {
        return mg;
    }
    if half_life_hours.is_nan() || half_life_hours <= 0.0 {
        return mg;
    }
    (mg * 0.5_f64.powf(elapsed_hours / half_life_hours))
        .round()
        .max(0.0)
}

/// Hours for a level of `mg` to decay to `target_mg`.
///
/// Returns `0` when the level is already at or below the target. A
/// non-positive target means "until it reads zero", which is half a milligram.
pub fn hours_to_reach(mg: f64, target_mg: f64, half_life_hours: f64) -> f64 {
    if mg.is_nan() || target_mg.is_nan() || half_life_hours.is_nan() || half_life_hours <= 0.0 {
        return 0.0;
    }
    let target = target_mg.max(ROUNDS_TO_ZERO_MG);
    if mg <= target {
        return 0.0;
    }
    half_life_hours * (mg / target).log2()
}

/// Clamps a raw caffeine amount to something the engine can sum.
///
/// Returns `None` for malformed amounts (negative, NaN, infinite) so callers
/// can log and drop the record.
pub fn sanitize_mg(mg: f64) -> Option<f64> {
    (mg.is_finite() && mg >= 0.0).then_some(mg)
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    reason = "decay results are rounded to whole numbers"
)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn half_life_halves_the_dose() {
        assert_eq!(remaining(200.0, 5.0, 5.0), 100.0);
        assert_eq!(remaining(200.0, 10.0, 5.0), 50.0);
        assert_eq!(remaining(200.0, 15.0, 5.0), 25.0);
    }

    #[test]
    fn partial_half_lives_round_to_whole_mg() {
        // 200 × 0.5^(8/5) = 65.98
        assert_eq!(remaining(200.0, 8.0, 5.0), 66.0);
        // 200 × 0.5^(2/5) = 151.57
        assert_eq!(remaining(200.0, 2.0, 5.0), 152.0);
    }

    #[test]
    fn no_decay_into_the_past() {
        assert_eq!(remaining(95.0, 0.0, 5.0), 95.0);
        assert_eq!(remaining(95.0, -3.0, 5.0), 95.0);
    }

    #[test]
    fn malformed_amounts_contribute_nothing() {
        assert_eq!(remaining(-50.0, 1.0, 5.0), 0.0);
        assert_eq!(remaining(f64::NAN, 1.0, 5.0), 0.0);
        assert_eq!(remaining(f64::INFINITY, 1.0, 5.0), 0.0);
    }

    #[test]
    fn hours_to_reach_inverts_decay() {
        assert_eq!(hours_to_reach(200.0, 100.0, 5.0), 5.0);
        assert_eq!(hours_to_reach(200.0, 50.0, 5.0), 10.0);
    }

    #[test]
    fn hours_to_reach_is_zero_when_already_below_target() {
        assert_eq!(hours_to_reach(100.0, 100.0, 5.0), 0.0);
        assert_eq!(hours_to_reach(40.0, 100.0, 5.0), 0.0);
    }

    #[test]
    fn hours_to_reach_non_positive_target_means_reads_zero() {
        let hours = hours_to_reach(100.0, 0.0, 5.0);
        assert!(hours.is_finite());
        assert_eq!(remaining(100.0, hours + 0.01, 5.0), 0.0);
    }

    #[test]
    fn sanitize_rejects_malformed() {
        assert_eq!(sanitize_mg(95.0), Some(95.0));
        assert_eq!(sanitize_mg(0.0), Some(0.0));
        assert_eq!(sanitize_mg(-1.0), None);
        assert_eq!(sanitize_mg(f64::NAN), None);
    }

    #[test]
    fn parameters_delegate_to_free_functions() {
        let params = DecayParameters::default();
        assert_eq!(params.remaining(200.0, 5.0), 100.0);
        assert_eq!(params.hours_to_reach(200.0, 100.0), 5.0);
    }

    proptest! {
        #[test]
        fn zero_elapsed_is_identity(mg in 0.0_f64..2_000.0, h in 0.5_f64..12.0) {
            prop_assert_eq!(remaining(mg, 0.0, h), mg);
        }

        #[test]
        fn zero_dose_stays_zero(t in -24.0_f64..72.0, h in 0.5_f64..12.0) {
            prop_assert_eq!(remaining(0.0, t, h), 0.0);
        }

        #[test]
        fn decay_is_monotonic(
            mg in (0_u32..2_000).prop_map(f64::from),
            t in 0.0_f64..48.0,
            dt in 0.0_f64..48.0,
            h in 0.5_f64..12.0,
        ) {
            prop_assert!(remaining(mg, t + dt, h) <= remaining(mg, t, h));
        }
    }
}
