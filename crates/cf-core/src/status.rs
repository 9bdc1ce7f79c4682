//! Live caffeine status.
//!
//! [`compute_status`] folds a snapshot of doses into a [`CaffeineStatus`]:
//! current level, today's peak, today's total and the bedtime forecast.

use std::fmt;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{hours_between, local_midnight, next_bedtime, start_of_local_day};
use crate::event::{Dose, DoseEvent, sorted_doses};
use crate::thresholds::Thresholds;

/// Forecast of residual caffeine at bedtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepRisk {
    Low,
    Medium,
    High,
}

impl SleepRisk {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for SleepRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the user's caffeine state at one instant.
///
/// Recomputed on demand and never persisted. `peak_level_mg` is never below
/// `current_level_mg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaffeineStatus {
    /// The instant the snapshot describes.
    pub computed_at: DateTime<Utc>,
    pub current_level_mg: u32,
    /// Highest level reached since local midnight.
    pub peak_level_mg: u32,
    /// Caffeine ingested since local midnight.
    pub daily_consumed_mg: u32,
    pub daily_limit_mg: u32,
    /// Share of the daily limit consumed, capped at 100.
    pub daily_progress_pct: f64,
    pub bedtime_at: DateTime<Utc>,
    pub hours_to_bedtime: f64,
    pub projected_at_bedtime_mg: u32,
    pub sleep_risk: SleepRisk,
    /// Zero when another dose would fit under the jitter ceiling.
    pub hours_to_next_safe_dose: f64,
    pub is_safe_for_next_dose: bool,
}

/// Computes the status at `now`.
///
/// `events` should reach back at least 24 hours so the decay tail of
/// yesterday's doses is counted; older doses contribute next to nothing but
/// are harmless. Doses dated after `now` do not count toward the current
/// level or today's total, but do count toward the bedtime forecast if they
/// fall before bedtime.
///
/// Malformed amounts are skipped; the function never fails.
pub fn compute_status<E: DoseEvent, Tz: TimeZone>(
    events: &[E],
    now: &DateTime<Tz>,
    bedtime: NaiveTime,
    daily_limit_mg: u32,
    thresholds: &Thresholds,
) -> CaffeineStatus {
    let doses = sorted_doses(events);
    let now_utc = now.with_timezone(&Utc);
    let half_life = thresholds.half_life_hours;

    let day_start = start_of_local_day(now);
    let day_end = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .map_or(DateTime::<Utc>::MAX_UTC, |d| local_midnight(&now.timezone(), d));

    let current = level_at(&doses, now_utc, half_life);

    // Local maxima only occur at dose instants.
    let peak = doses
        .iter()
        .filter(|d| d.at >= day_start && d.at <= now_utc)
        .map(|d| level_at(&doses, d.at, half_life))
        .fold(current, f64::max);

    let consumed: f64 = doses
        .iter()
        .filter(|d| d.at >= day_start && d.at < day_end && d.at <= now_utc)
        .map(|d| d.mg)
        .sum();

    let bedtime_at = next_bedtime(now, bedtime);
    let projected = level_at(&doses, bedtime_at, half_life);
    let sleep_risk = thresholds.sleep_risk(projected);

    let wait = thresholds.jitter_wait_hours(current);

    let status = CaffeineStatus {
        computed_at: now_utc,
        current_level_mg: whole_mg(current),
        peak_level_mg: whole_mg(peak),
        daily_consumed_mg: whole_mg(consumed),
        daily_limit_mg,
        daily_progress_pct: progress_pct(consumed, daily_limit_mg),
        bedtime_at,
        hours_to_bedtime: hours_between(now_utc, bedtime_at),
        projected_at_bedtime_mg: whole_mg(projected),
        sleep_risk,
        hours_to_next_safe_dose: wait.unwrap_or(0.0),
        is_safe_for_next_dose: wait.is_none(),
    };

    tracing::debug!(
        doses = doses.len(),
        current = status.current_level_mg,
        peak = status.peak_level_mg,
        consumed = status.daily_consumed_mg,
        projected = status.projected_at_bedtime_mg,
        sleep_risk = %status.sleep_risk,
        "computed caffeine status"
    );

    status
}

/// Level at `at` from every dose taken at or before it.
fn level_at(doses: &[Dose], at: DateTime<Utc>, half_life: f64) -> f64 {
    doses
        .iter()
        .take_while(|d| d.at <= at)
        .map(|d| crate::decay::remaining(d.mg, hours_between(d.at, at), half_life))
        .sum::<f64>()
        .round()
        .max(0.0)
}

fn progress_pct(consumed: f64, limit: u32) -> f64 {
    if limit == 0 {
        return if consumed > 0.0 { 100.0 } else { 0.0 };
    }
    (consumed / f64::from(limit) * 100.0).min(100.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn whole_mg(mg: f64) -> u32 {
    if mg.is_nan() {
        return 0;
    }
    mg.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A status with the given levels and neutral everything else.
    pub fn status(current_mg: u32, projected_mg: u32, sleep_risk: SleepRisk) -> CaffeineStatus {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 15, 0, 0).unwrap();
        CaffeineStatus {
            computed_at: now,
            current_level_mg: current_mg,
            peak_level_mg: current_mg,
            daily_consumed_mg: current_mg,
            daily_limit_mg: 400,
            daily_progress_pct: 0.0,
            bedtime_at: now + chrono::Duration::hours(8),
            hours_to_bedtime: 8.0,
            projected_at_bedtime_mg: projected_mg,
            sleep_risk,
            hours_to_next_safe_dose: 0.0,
            is_safe_for_next_dose: true,
        }
    }
}
