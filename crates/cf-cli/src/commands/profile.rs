//! Profile command for the longitudinal summary and badges.

use std::fmt::Write;

use anyhow::{Context, Result};
use cf_core::{BadgeId, CaffeineProfile, Engine, newly_earned};
use cf_db::Database;
use chrono::{Local, Utc};
use serde::Serialize;

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonProfile<'a> {
    #[serde(flatten)]
    pub profile: &'a CaffeineProfile,
    pub new_badges: &'a [BadgeId],
}

/// Records newly earned badges as seen and returns them.
pub fn claim_new_badges(db: &mut Database, profile: &CaffeineProfile) -> Result<Vec<BadgeId>> {
    let seen = db.seen_badges().context("failed to read seen badges")?;
    let new = newly_earned(&seen, &profile.badges);
    if !new.is_empty() {
        db.mark_badges_seen(&new, Utc::now())
            .context("failed to record seen badges")?;
    }
    Ok(new)
}

/// Format a profile for human-readable output.
pub fn format_profile(profile: &CaffeineProfile, new_badges: &[BadgeId]) -> String {
    let mut output = String::new();

    writeln!(output, "CAFFEINE PROFILE").unwrap();
    writeln!(output).unwrap();

    if !profile.is_unlocked {
        let plural = if profile.days_until_unlock == 1 { "" } else { "s" };
        writeln!(
            output,
            "Track {} more day{plural} to unlock your full profile.",
            profile.days_until_unlock
        )
        .unwrap();
        writeln!(output).unwrap();
    }

    let stats = &profile.stats;
    writeln!(
        output,
        "{:<13}  {}. {}",
        "Timing",
        profile.timing_pattern.title(),
        profile.timing_pattern.description()
    )
    .unwrap();
    writeln!(
        output,
        "{:<13}  {} ({:.0} mg/day)",
        "Consumption", profile.consumption_level, profile.pattern.avg_daily_mg
    )
    .unwrap();
    writeln!(
        output,
        "{:<13}  {}. {}",
        "Sensitivity", profile.sensitivity_level, profile.sensitivity.description
    )
    .unwrap();
    writeln!(
        output,
        "{:<13}  {} days (longest {})",
        "Streak", stats.current_streak_days, stats.longest_streak_days
    )
    .unwrap();
    writeln!(output, "{:<13}  {}", "Days tracked", profile.days_tracked).unwrap();
    writeln!(
        output,
        "{:<13}  {} of 7 days, {:.0} mg/day, {:.0}% before noon",
        "This week",
        stats.week_days_tracked,
        stats.week_avg_daily_mg,
        stats.week_before_noon_pct()
    )
    .unwrap();

    writeln!(output).unwrap();
    writeln!(output, "BADGES").unwrap();
    for badge in &profile.badges {
        let mark = if badge.earned { "x" } else { " " };
        writeln!(
            output,
            "  [{mark}] {:<15}  {}",
            badge.name, badge.description
        )
        .unwrap();
    }

    if !new_badges.is_empty() {
        let names: Vec<&str> = new_badges.iter().map(BadgeId::name).collect();
        writeln!(output).unwrap();
        writeln!(output, "New badge unlocked: {}", names.join(", ")).unwrap();
    }

    output
}

/// Runs the profile command.
pub fn run(db: &mut Database, engine: &Engine, json: bool) -> Result<()> {
    let now = Local::now();
    let profile = engine
        .load_profile(&*db, &now)
        .context("failed to build profile")?;
    let new_badges = claim_new_badges(db, &profile)?;

    if json {
        let output = JsonProfile {
            profile: &profile,
            new_badges: &new_badges,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_profile(&profile, &new_badges));
    }
    Ok(())
}
