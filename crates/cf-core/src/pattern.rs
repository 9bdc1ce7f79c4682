//! Rolling-window consumption patterns.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::clock::{days_before, local_hour_of_day, local_midnight};
use crate::event::{DoseEvent, sorted_doses};

/// Default analysis window in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Doses before this local hour count as well-timed.
pub const OPTIMAL_CUTOFF_HOUR: u32 = 14;

/// Aggregate habits over the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPattern {
    pub window_days: u32,
    /// Local dates in the window with at least one dose.
    pub days_with_data: usize,
    pub total_doses: usize,
    /// Mean hour of the first dose of each day (fractional, 0-24).
    pub avg_first_dose_hour: f64,
    /// Mean hour of the last dose of each day (fractional, 0-24).
    pub avg_last_dose_hour: f64,
    /// Hour of day with the most caffeine.
    pub peak_hour: u8,
    /// Mean mg over days with data.
    pub avg_daily_mg: f64,
    pub weekday_avg_mg: f64,
    pub weekend_avg_mg: f64,
    /// `weekend_avg_mg - weekday_avg_mg`; zero unless both sides have data.
    pub weekend_delta_mg: f64,
    /// Share of doses taken before 14:00, in percent.
    pub optimal_timing_pct: f64,
    /// True when there was nothing to analyze.
    pub is_baseline: bool,
}

impl ConsumptionPattern {
    /// The neutral pattern returned for an empty history.
    pub const fn baseline(window_days: u32) -> Self {
        Self {
            window_days,
            days_with_data: 0,
            total_doses: 0,
            avg_first_dose_hour: 8.0,
            avg_last_dose_hour: 14.0,
            peak_hour: 8,
            avg_daily_mg: 0.0,
            weekday_avg_mg: 0.0,
            weekend_avg_mg: 0.0,
            weekend_delta_mg: 0.0,
            optimal_timing_pct: 100.0,
            is_baseline: true,
        }
    }
}

#[derive(Debug, Default)]
struct DayBucket {
    first_hour: f64,
    last_hour: f64,
    total_mg: f64,
}

/// Analyzes the last `window_days` local days, today included.
///
/// Days are grouped in the zone of `now`. A zero-day window is treated as
/// one day.
#[allow(clippy::cast_precision_loss)]
pub fn analyze_patterns<E: DoseEvent, Tz: TimeZone>(
    events: &[E],
    now: &DateTime<Tz>,
    window_days: u32,
) -> ConsumptionPattern {
    let window_days = window_days.max(1);
    let tz = now.timezone();
    let today = now.date_naive();
    let start = local_midnight(&tz, days_before(today, window_days - 1));
    let end = today
        .succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, |d| local_midnight(&tz, d));

    let doses: Vec<_> = sorted_doses(events)
        .into_iter()
        .filter(|d| d.at >= start && d.at < end)
        .collect();

    if doses.is_empty() {
        tracing::debug!(window_days, "no doses in window, using baseline pattern");
        return ConsumptionPattern::baseline(window_days);
    }

    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    let mut weighted = [0.0_f64; 24];
    let mut counts = [0_u32; 24];
    let mut well_timed = 0_usize;

    // Doses are sorted, so the first dose seen per day is its earliest.
    for dose in &doses {
        let local = dose.at.with_timezone(&tz);
        let hour = local.hour() as usize;
        let fractional = local_hour_of_day(dose.at, &tz);

        let bucket = days.entry(local.date_naive()).or_insert_with(|| DayBucket {
            first_hour: fractional,
            ..DayBucket::default()
        });
        bucket.last_hour = fractional;
        bucket.total_mg += dose.mg;

        weighted[hour] += dose.mg;
        counts[hour] += 1;
        if local.hour() < OPTIMAL_CUTOFF_HOUR {
            well_timed += 1;
        }
    }

    let day_count = days.len() as f64;
    let mean = |values: &[f64]| {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    let (weekend, weekday): (Vec<_>, Vec<_>) = days
        .iter()
        .partition(|(date, _)| matches!(date.weekday(), Weekday::Sat | Weekday::Sun));
    let weekend_totals: Vec<f64> = weekend.iter().map(|(_, b)| b.total_mg).collect();
    let weekday_totals: Vec<f64> = weekday.iter().map(|(_, b)| b.total_mg).collect();
    let weekend_avg = mean(&weekend_totals);
    let weekday_avg = mean(&weekday_totals);

    let pattern = ConsumptionPattern {
        window_days,
        days_with_data: days.len(),
        total_doses: doses.len(),
        avg_first_dose_hour: days.values().map(|b| b.first_hour).sum::<f64>() / day_count,
        avg_last_dose_hour: days.values().map(|b| b.last_hour).sum::<f64>() / day_count,
        peak_hour: peak_hour(&weighted, &counts),
        avg_daily_mg: days.values().map(|b| b.total_mg).sum::<f64>() / day_count,
        weekday_avg_mg: weekday_avg.unwrap_or(0.0),
        weekend_avg_mg: weekend_avg.unwrap_or(0.0),
        weekend_delta_mg: match (weekend_avg, weekday_avg) {
            (Some(weekend), Some(weekday)) => weekend - weekday,
            _ => 0.0,
        },
        optimal_timing_pct: well_timed as f64 / doses.len() as f64 * 100.0,
        is_baseline: false,
    };

    tracing::debug!(
        window_days,
        days = pattern.days_with_data,
        doses = pattern.total_doses,
        peak_hour = pattern.peak_hour,
        "analyzed consumption pattern"
    );

    pattern
}

/// Argmax of the mg-weighted histogram; plain counts break an all-zero tie.
/// The earliest hour wins among equals.
#[expect(clippy::cast_possible_truncation, reason = "index is always < 24")]
fn peak_hour(weighted: &[f64; 24], counts: &[u32; 24]) -> u8 {
    let use_counts = weighted.iter().all(|w| *w <= 0.0);
    let mut best = 0;
    for hour in 1..24 {
        let better = if use_counts {
            counts[hour] > counts[best]
        } else {
            weighted[hour] > weighted[best]
        };
        if better {
            best = hour;
        }
    }
    best as u8
}
