//! Patterns command for consumption habits over the rolling window.

use std::fmt::Write;

use anyhow::{Context, Result};
use cf_core::clock::format_hour_of_day;
use cf_core::{ConsumptionPattern, Engine};
use cf_db::Database;
use chrono::Local;
use serde::Serialize;

use super::util::timezone_name;

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonPatterns<'a> {
    pub timezone: String,
    #[serde(flatten)]
    pub pattern: &'a ConsumptionPattern,
}

/// Format a pattern for human-readable output.
pub fn format_patterns(pattern: &ConsumptionPattern) -> String {
    let mut output = String::new();

    writeln!(output, "PATTERNS (last {} days)", pattern.window_days).unwrap();
    writeln!(output).unwrap();

    if pattern.is_baseline {
        writeln!(output, "No doses logged in this window yet.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'cf log --drink drip-coffee' to log your first cup.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<18}  {} of {}",
        "Days with data", pattern.days_with_data, pattern.window_days
    )
    .unwrap();
    writeln!(output, "{:<18}  {}", "Doses", pattern.total_doses).unwrap();
    writeln!(
        output,
        "{:<18}  {} on average",
        "First dose",
        format_hour_of_day(pattern.avg_first_dose_hour)
    )
    .unwrap();
    writeln!(
        output,
        "{:<18}  {} on average",
        "Last dose",
        format_hour_of_day(pattern.avg_last_dose_hour)
    )
    .unwrap();
    writeln!(
        output,
        "{:<18}  {}",
        "Peak hour",
        format_hour_of_day(f64::from(pattern.peak_hour))
    )
    .unwrap();
    writeln!(output, "{:<18}  {:.0} mg", "Daily average", pattern.avg_daily_mg).unwrap();
    writeln!(
        output,
        "{:<18}  {:.0} mg / {:.0} mg ({:+.0} mg on weekends)",
        "Weekdays/weekends",
        pattern.weekday_avg_mg,
        pattern.weekend_avg_mg,
        pattern.weekend_delta_mg
    )
    .unwrap();
    writeln!(
        output,
        "{:<18}  {:.0}%",
        "Before 14:00", pattern.optimal_timing_pct
    )
    .unwrap();

    output
}

/// Runs the patterns command.
pub fn run(db: &Database, engine: &Engine, days: Option<u32>, json: bool) -> Result<()> {
    let engine = match days {
        Some(days) => Engine::new(*engine.thresholds(), days).context("invalid --days")?,
        None => *engine,
    };

    let now = Local::now();
    let events = db.list_events().context("failed to read doses")?;
    let pattern = engine.patterns(&events, &now);

    if json {
        let output = JsonPatterns {
            timezone: timezone_name(),
            pattern: &pattern,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_patterns(&pattern));
    }
    Ok(())
}
