//! Tracking statistics used by badges and the profile gate.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::clock::days_before;
use crate::event::{DoseEvent, sorted_doses};

/// Length of the trailing week in days.
pub const WEEK_DAYS: u32 = 7;

/// Doses before this local hour count as morning doses.
const NOON: u32 = 12;

/// Logging statistics as of today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingStats {
    /// Distinct local dates with at least one dose.
    pub days_tracked: usize,
    /// Consecutive logged days ending today; zero if nothing today.
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub total_doses: usize,
    /// Logged days among the last seven, today included.
    pub week_days_tracked: usize,
    /// Trailing-week total divided by seven.
    pub week_avg_daily_mg: f64,
    pub week_doses: usize,
    pub week_before_noon_doses: usize,
    pub first_tracked: Option<NaiveDate>,
}

impl TrackingStats {
    /// Computes stats for the local day of `now`. Doses on later dates are ignored.
    pub fn compute<E: DoseEvent, Tz: TimeZone>(events: &[E], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let week_start = days_before(today, WEEK_DAYS - 1);

        let mut dates = BTreeSet::new();
        let mut total_doses = 0;
        let mut week_mg = 0.0;
        let mut week_doses = 0;
        let mut week_before_noon_doses = 0;
        let mut week_dates = BTreeSet::new();

        for dose in sorted_doses(events) {
            let local = dose.at.with_timezone(&tz);
            let date = local.date_naive();
            if date > today {
                continue;
            }
            dates.insert(date);
            total_doses += 1;
            if date >= week_start {
                week_dates.insert(date);
                week_mg += dose.mg;
                week_doses += 1;
                if local.hour() < NOON {
                    week_before_noon_doses += 1;
                }
            }
        }

        Self {
            days_tracked: dates.len(),
            current_streak_days: streak_ending(&dates, today),
            longest_streak_days: longest_streak(&dates),
            total_doses,
            week_days_tracked: week_dates.len(),
            week_avg_daily_mg: week_mg / f64::from(WEEK_DAYS),
            week_doses,
            week_before_noon_doses,
            first_tracked: dates.first().copied(),
        }
    }

    /// Share of this week's doses taken before noon, in percent.
    #[allow(clippy::cast_precision_loss)]
    pub fn week_before_noon_pct(&self) -> f64 {
        if self.week_doses == 0 {
            return 0.0;
        }
        self.week_before_noon_doses as f64 / self.week_doses as f64 * 100.0
    }
}

fn streak_ending(dates: &BTreeSet<NaiveDate>, end: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = Some(end);
    while let Some(d) = day.filter(|d| dates.contains(d)) {
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

fn longest_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in dates {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == date => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }
    longest
}
