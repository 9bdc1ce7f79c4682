//! Local calendar helpers.
//!
//! The engine never reads the system clock. Callers pass `now` as a
//! `DateTime<Tz>`; its time zone defines what "today" and "bedtime" mean.

use chrono::{
    DateTime, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc,
};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Resolves a local wall-clock time to an instant.
///
/// Ambiguous times (DST fall-back) pick the earlier instant. Times inside a
/// spring-forward gap are pushed one hour later, which is where the wall clock
/// lands after the jump.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// Local midnight at the start of `date`, as UTC.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    resolve_local(tz, date.and_time(NaiveTime::MIN)).with_timezone(&Utc)
}

/// Start of the local calendar day containing `now`, as UTC.
pub fn start_of_local_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    local_midnight(&now.timezone(), now.date_naive())
}

/// The local date `offset` days before `date`, saturating at the calendar bounds.
pub fn days_before(date: NaiveDate, offset: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(NaiveDate::MIN)
}

/// The next occurrence of `bedtime` strictly after `now`.
///
/// A bedtime at or before the current time of day rolls over to tomorrow.
pub fn next_bedtime<Tz: TimeZone>(now: &DateTime<Tz>, bedtime: NaiveTime) -> DateTime<Utc> {
    let tz = now.timezone();
    let today = now.date_naive();
    let tonight = resolve_local(&tz, today.and_time(bedtime));
    if tonight > *now {
        return tonight.with_timezone(&Utc);
    }
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    resolve_local(&tz, tomorrow.and_time(bedtime)).with_timezone(&Utc)
}

/// Fractional hours from `from` to `to`; negative when `to` is earlier.
#[allow(clippy::cast_precision_loss)]
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_HOUR
}

/// Local calendar date of an instant in the given zone.
pub fn local_date<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Local time of day as fractional hours in `[0, 24)`.
pub fn local_hour_of_day<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> f64 {
    let local = at.with_timezone(tz);
    f64::from(local.hour())
        + f64::from(local.minute()) / 60.0
        + f64::from(local.second()) / 3_600.0
}

/// Formats a fractional hour of day as `HH:MM`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_hour_of_day(hour: f64) -> String {
    let total_minutes = (hour.clamp(0.0, 24.0) * 60.0).round() as u32 % (24 * 60);
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}
