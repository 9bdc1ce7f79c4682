//! The caffeine profile: every longitudinal output in one place.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::badges::{Badge, evaluate_badges};
use crate::checkin::SleepCheckin;
use crate::event::DoseEvent;
use crate::pattern::{ConsumptionPattern, analyze_patterns};
use crate::personality::{ConsumptionLevel, PersonalityTag, classify_personality};
use crate::sensitivity::{
    SensitivityLevel, SensitivityPreference, SensitivityResult, infer_sensitivity,
};
use crate::stats::TrackingStats;

/// Distinct tracked days needed before the profile unlocks.
pub const UNLOCK_DAYS: usize = 7;

/// Longitudinal summary of a user.
///
/// Everything is computed even while locked; `is_unlocked` only tells the
/// caller whether it is meaningful yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaffeineProfile {
    pub sensitivity_level: SensitivityLevel,
    pub sensitivity: SensitivityResult,
    pub timing_pattern: PersonalityTag,
    pub consumption_level: ConsumptionLevel,
    pub pattern: ConsumptionPattern,
    pub stats: TrackingStats,
    pub badges: Vec<Badge>,
    /// Distinct local dates with at least one dose, not necessarily consecutive.
    pub days_tracked: usize,
    pub is_unlocked: bool,
    pub days_until_unlock: usize,
}

/// Builds the profile as of `now`.
///
/// `events` should be the full history: streaks and days tracked look
/// beyond the pattern window.
pub fn build_profile<E: DoseEvent, Tz: TimeZone>(
    events: &[E],
    checkins: &[SleepCheckin],
    now: &DateTime<Tz>,
    preference: SensitivityPreference,
    window_days: u32,
) -> CaffeineProfile {
    let pattern = analyze_patterns(events, now, window_days);
    let stats = TrackingStats::compute(events, now);
    let sensitivity = infer_sensitivity(checkins, preference);
    let badges = evaluate_badges(checkins, events, &stats);
    let days_tracked = stats.days_tracked;

    CaffeineProfile {
        sensitivity_level: sensitivity.level,
        timing_pattern: classify_personality(&pattern, events),
        consumption_level: ConsumptionLevel::from_daily_mg(pattern.avg_daily_mg),
        sensitivity,
        pattern,
        stats,
        badges,
        days_tracked,
        is_unlocked: days_tracked >= UNLOCK_DAYS,
        days_until_unlock: UNLOCK_DAYS.saturating_sub(days_tracked),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, Utc};

    use crate::event::fixtures::TestDose;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 18, 0, 0).unwrap()
    }

    fn every_other_day(days: i64) -> Vec<TestDose> {
        (0..days)
            .map(|i| TestDose::coffee(95.0, now() - Duration::days(i * 2) - Duration::hours(9)))
            .collect()
    }

    #[test]
    fn empty_history_is_locked_baseline() {
        let profile =
            build_profile::<TestDose, _>(&[], &[], &now(), SensitivityPreference::Auto, 30);
        assert!(!profile.is_unlocked);
        assert_eq!(profile.days_until_unlock, 7);
        assert!(profile.pattern.is_baseline);
        assert_eq!(profile.timing_pattern, PersonalityTag::SteadySipper);
        assert_eq!(profile.consumption_level, ConsumptionLevel::Light);
        assert_eq!(profile.sensitivity_level, SensitivityLevel::Unknown);
    }

    #[test]
    fn unlocks_on_seven_non_consecutive_days() {
        let six = build_profile(&every_other_day(6), &[], &now(), SensitivityPreference::Auto, 30);
        assert!(!six.is_unlocked);
        assert_eq!(six.days_until_unlock, 1);

        let seven = build_profile(
            &every_other_day(7),
            &[],
            &now(),
            SensitivityPreference::Auto,
            30,
        );
        assert!(seven.is_unlocked);
        assert_eq!(seven.days_until_unlock, 0);
        assert_eq!(seven.stats.longest_streak_days, 1);
    }

    #[test]
    fn override_flows_into_profile() {
        let profile =
            build_profile::<TestDose, _>(&[], &[], &now(), SensitivityPreference::High, 30);
        assert_eq!(profile.sensitivity_level, SensitivityLevel::High);
        assert_eq!(profile.sensitivity.inferred, SensitivityLevel::Unknown);
    }
}
