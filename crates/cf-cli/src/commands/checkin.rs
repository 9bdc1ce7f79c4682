//! Check-in command for recording sleep quality.

use std::fmt::Write;

use anyhow::{Context, Result};
use cf_core::clock::{format_hour_of_day, local_midnight};
use cf_core::{SleepCheckin, SleepQuality};
use cf_db::{Database, DbError};
use chrono::{Local, NaiveDate, TimeZone, Utc};

use super::util::parse_date;

/// Builds and stores the check-in for `date`, deriving yesterday's totals
/// from the logged doses.
pub fn record<Tz: TimeZone>(
    db: &Database,
    date: NaiveDate,
    quality: SleepQuality,
    tz: &Tz,
) -> Result<SleepCheckin> {
    let yesterday = date.pred_opt().unwrap_or(date);
    let events = db
        .list_events_in_range(local_midnight(tz, yesterday), local_midnight(tz, date))
        .context("failed to read yesterday's doses")?;
    let checkin = SleepCheckin::from_log(date, quality, &events, tz, Utc::now());

    match db.insert_checkin(&checkin) {
        Ok(()) => Ok(checkin),
        Err(DbError::DuplicateCheckin { date }) => {
            anyhow::bail!("Already checked in for {date}. One check-in per day.")
        }
        Err(e) => Err(e).context("failed to save check-in"),
    }
}

/// Confirmation printed after a check-in.
pub fn format_checkin(checkin: &SleepCheckin) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "Checked in for {}: slept {}.",
        checkin.date, checkin.quality
    )
    .unwrap();
    write!(
        output,
        "Yesterday: {:.0} mg",
        checkin.yesterday_caffeine_mg
    )
    .unwrap();
    if let Some(hour) = checkin.yesterday_last_coffee_hour {
        write!(
            output,
            ", last dose around {}",
            format_hour_of_day(f64::from(hour))
        )
        .unwrap();
    }
    writeln!(output, ".").unwrap();
    output
}

/// Runs the check-in command.
pub fn run(db: &Database, quality: &str, date: Option<&str>) -> Result<()> {
    let quality: SleepQuality = quality.parse()?;
    let date = match date {
        Some(date) => parse_date(date)?,
        None => Local::now().date_naive(),
    };

    let checkin = record(db, date, quality, &Local)?;
    print!("{}", format_checkin(&checkin));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use cf_core::{ConsumptionEvent, EventId, SubstanceId};
    use chrono::{DateTime, FixedOffset};
    use insta::assert_snapshot;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn dose(id: &str, mg: f64, at: DateTime<Utc>) -> ConsumptionEvent {
        ConsumptionEvent::new(
            EventId::new(id).unwrap(),
            SubstanceId::new("drip-coffee").unwrap(),
            "Drip coffee",
            mg,
            at,
            at,
        )
        .unwrap()
    }

    #[test]
    fn derives_yesterday_from_the_log() {
        let db = Database::open_in_memory().expect("open in-memory db");
        // 08:00 and 15:30 local on the 14th, plus one on the 15th that must not count.
        db.insert_event(&dose("a", 95.0, Utc.with_ymd_and_hms(2025, 1, 14, 7, 0, 0).unwrap()))
            .unwrap();
        db.insert_event(&dose("b", 63.0, Utc.with_ymd_and_hms(2025, 1, 14, 14, 30, 0).unwrap()))
            .unwrap();
        db.insert_event(&dose("c", 200.0, Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap()))
            .unwrap();

        let checkin = record(&db, date(), SleepQuality::Poor, &tz()).unwrap();
        assert!((checkin.yesterday_caffeine_mg - 158.0).abs() < f64::EPSILON);
        assert_eq!(checkin.yesterday_last_coffee_hour, Some(15));
        assert_eq!(db.list_checkins().unwrap().len(), 1);
    }

    #[test]
    fn second_checkin_for_a_date_is_rejected() {
        let db = Database::open_in_memory().expect("open in-memory db");
        record(&db, date(), SleepQuality::Great, &tz()).unwrap();
        let err = record(&db, date(), SleepQuality::Poor, &tz()).unwrap_err();
        assert!(err.to_string().contains("Already checked in for 2025-01-15"));

        let stored = db.list_checkins().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].quality, SleepQuality::Great);
    }

    #[test]
    fn format_with_and_without_last_dose() {
        let created = Utc.with_ymd_and_hms(2025, 1, 15, 7, 0, 0).unwrap();
        let with_dose =
            SleepCheckin::new(date(), SleepQuality::Ok, 221.0, Some(16), created).unwrap();
        assert_snapshot!(format_checkin(&with_dose), @r"
        Checked in for 2025-01-15: slept ok.
        Yesterday: 221 mg, last dose around 16:00.
        ");

        let without = SleepCheckin::new(date(), SleepQuality::Great, 0.0, None, created).unwrap();
        assert_snapshot!(format_checkin(&without), @r"
        Checked in for 2025-01-15: slept great.
        Yesterday: 0 mg.
        ");
    }
}
