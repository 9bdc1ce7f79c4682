//! Morning sleep check-ins.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::local_midnight;
use crate::decay::sanitize_mg;
use crate::event::{DoseEvent, sorted_doses};
use crate::types::{SleepQuality, ValidationError, check_hour};

/// How last night went, plus what "yesterday" looked like caffeine-wise.
///
/// At most one check-in exists per local date; the store enforces this and
/// [`unique_by_date`] guards the engine against duplicates that slip through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepCheckin {
    /// Local date of the morning the check-in was made.
    pub date: NaiveDate,
    /// Self-reported quality.
    pub quality: SleepQuality,
    /// Total caffeine logged the previous day.
    pub yesterday_caffeine_mg: f64,
    /// Local hour (0-23) of the previous day's last dose, if any.
    pub yesterday_last_coffee_hour: Option<u8>,
    /// When the check-in was recorded.
    pub created_at: DateTime<Utc>,
}

impl SleepCheckin {
    /// Creates a check-in after validating the amount and hour.
    pub fn new(
        date: NaiveDate,
        quality: SleepQuality,
        yesterday_caffeine_mg: f64,
        yesterday_last_coffee_hour: Option<u32>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let yesterday_caffeine_mg = sanitize_mg(yesterday_caffeine_mg).ok_or(
            ValidationError::InvalidAmount {
                value: yesterday_caffeine_mg,
            },
        )?;
        let yesterday_last_coffee_hour = yesterday_last_coffee_hour.map(check_hour).transpose()?;
        Ok(Self {
            date,
            quality,
            yesterday_caffeine_mg,
            yesterday_last_coffee_hour,
            created_at,
        })
    }

    /// Builds a check-in for `date`, deriving yesterday's totals from the log.
    pub fn from_log<E: DoseEvent, Tz: TimeZone>(
        date: NaiveDate,
        quality: SleepQuality,
        events: &[E],
        tz: &Tz,
        created_at: DateTime<Utc>,
    ) -> Self {
        let summary = DaySummary::for_date(events, date.pred_opt().unwrap_or(date), tz);
        Self {
            date,
            quality,
            yesterday_caffeine_mg: summary.total_mg,
            yesterday_last_coffee_hour: summary.last_dose_hour,
            created_at,
        }
    }
}

/// Caffeine totals for one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySummary {
    pub total_mg: f64,
    pub last_dose_hour: Option<u8>,
}

impl DaySummary {
    /// Summarizes doses consumed on the local date `date`.
    pub fn for_date<E: DoseEvent, Tz: TimeZone>(events: &[E], date: NaiveDate, tz: &Tz) -> Self {
        let start = local_midnight(tz, date);
        let end = date
            .succ_opt()
            .map_or(DateTime::<Utc>::MAX_UTC, |next| local_midnight(tz, next));

        let doses: Vec<_> = sorted_doses(events)
            .into_iter()
            .filter(|d| d.at >= start && d.at < end)
            .collect();

        #[expect(clippy::cast_possible_truncation, reason = "hour() is always < 24")]
        let last_dose_hour = doses
            .last()
            .map(|d| d.at.with_timezone(tz).hour() as u8);

        Self {
            total_mg: doses.iter().map(|d| d.mg).sum(),
            last_dose_hour,
        }
    }
}

/// Keeps the first check-in recorded for each local date.
pub fn unique_by_date(checkins: &[SleepCheckin]) -> Vec<&SleepCheckin> {
    let mut sorted: Vec<&SleepCheckin> = checkins.iter().collect();
    sorted.sort_by_key(|c| (c.date, c.created_at));

    let mut seen = HashSet::new();
    sorted.retain(|c| {
        let first = seen.insert(c.date);
        if !first {
            tracing::warn!(date = %c.date, "ignoring duplicate sleep check-in");
        }
        first
    });
    sorted
}
