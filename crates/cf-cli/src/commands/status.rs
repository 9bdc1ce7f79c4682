//! Status command for the live caffeine level and guidance.

use std::fmt::Write;

use anyhow::{Context, Result};
use cf_core::{Dashboard, Engine, format_wait};
use cf_db::Database;
use chrono::{Local, TimeZone};
use serde::Serialize;

use super::util::{format_clock, progress_bar, timezone_name};

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonStatus<'a> {
    pub timezone: String,
    #[serde(flatten)]
    pub dashboard: &'a Dashboard,
}

/// Format the dashboard for human-readable output.
pub fn format_status<Tz: TimeZone>(dashboard: &Dashboard, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let status = &dashboard.status;
    let guidance = &dashboard.guidance;
    let mut output = String::new();

    writeln!(
        output,
        "CAFFEINE STATUS ({})",
        format_clock(status.computed_at, tz)
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "● {}  {}",
        guidance.color.as_str().to_uppercase(),
        guidance.headline
    )
    .unwrap();
    writeln!(output, "{}", guidance.message).unwrap();
    writeln!(output).unwrap();

    writeln!(
        output,
        "{:<14}  {} mg (peak today {} mg)",
        "Current level", status.current_level_mg, status.peak_level_mg
    )
    .unwrap();
    writeln!(
        output,
        "{:<14}  {} / {} mg  {}  {:.0}%",
        "Today",
        status.daily_consumed_mg,
        status.daily_limit_mg,
        progress_bar(status.daily_progress_pct),
        status.daily_progress_pct
    )
    .unwrap();
    writeln!(
        output,
        "{:<14}  {}, in {}",
        "Bedtime",
        format_clock(status.bedtime_at, tz),
        format_wait(status.hours_to_bedtime)
    )
    .unwrap();
    writeln!(
        output,
        "{:<14}  {} mg ({} sleep risk)",
        "At bedtime", status.projected_at_bedtime_mg, status.sleep_risk
    )
    .unwrap();
    let next_dose = if status.is_safe_for_next_dose {
        "safe now".to_string()
    } else {
        format!("in {}", format_wait(status.hours_to_next_safe_dose))
    };
    writeln!(output, "{:<14}  {next_dose}", "Next dose").unwrap();
    writeln!(
        output,
        "{:<14}  {}. {}",
        "Sensitivity", dashboard.sensitivity.level, dashboard.sensitivity.description
    )
    .unwrap();

    output
}

/// Format the dashboard as JSON.
pub fn format_status_json(dashboard: &Dashboard, timezone: String) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonStatus {
        timezone,
        dashboard,
    })?)
}

/// Runs the status command.
pub fn run(db: &Database, engine: &Engine, json: bool) -> Result<()> {
    let now = Local::now();
    let dashboard = engine
        .load_dashboard(db, &now)
        .context("failed to compute status")?;

    if json {
        println!("{}", format_status_json(&dashboard, timezone_name())?);
    } else {
        print!("{}", format_status(&dashboard, &Local));
    }
    Ok(())
}
