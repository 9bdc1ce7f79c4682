//! Watch command: re-evaluates guidance on an interval and reports color
//! changes as they happen.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use cf_core::{ColorTransition, Dashboard, Engine, GuidanceColor};
use cf_db::Database;
use chrono::{Local, TimeZone};

use super::util::format_clock;

/// Remembers the last guidance color between evaluations.
#[derive(Debug, Default)]
pub struct Watcher {
    previous: Option<GuidanceColor>,
}

impl Watcher {
    /// Records `color` and returns the transition from the previous one.
    pub fn observe(&mut self, color: GuidanceColor) -> Option<ColorTransition> {
        let transition = ColorTransition::between(self.previous, color);
        self.previous = Some(color);
        transition
    }
}

/// One line per evaluation worth printing.
pub fn format_tick<Tz: TimeZone>(
    dashboard: &Dashboard,
    transition: Option<&ColorTransition>,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let status = &dashboard.status;
    let guidance = &dashboard.guidance;
    let time = format_clock(status.computed_at, tz);
    let color = guidance.color.as_str().to_uppercase();
    match transition {
        Some(t) => format!(
            "[{time}] {} -> {color}  {} ({} mg now, {} mg at bedtime)",
            t.from.as_str().to_uppercase(),
            guidance.headline,
            status.current_level_mg,
            status.projected_at_bedtime_mg
        ),
        None => format!(
            "[{time}] {color}  {} ({} mg now, {} mg at bedtime)",
            guidance.headline, status.current_level_mg, status.projected_at_bedtime_mg
        ),
    }
}

/// Runs the watch command.
///
/// Prints the first evaluation and every color change after it. Stops after
/// `ticks` evaluations, or never if `ticks` is `None`.
pub fn run(db: &Database, engine: &Engine, interval_secs: u64, ticks: Option<u64>) -> Result<()> {
    let mut watcher = Watcher::default();
    let mut tick = 0_u64;

    loop {
        let now = Local::now();
        let dashboard = engine
            .load_dashboard(db, &now)
            .context("failed to compute status")?;
        let color = dashboard.guidance.color;
        let first = tick == 0;
        let transition = watcher.observe(color);

        if let Some(t) = &transition {
            if t.is_escalation() {
                tracing::warn!(from = %t.from, to = %t.to, "guidance escalated");
            } else {
                tracing::info!(from = %t.from, to = %t.to, "guidance relaxed");
            }
        } else {
            tracing::debug!(color = %color, "guidance unchanged");
        }

        if first || transition.is_some() {
            println!("{}", format_tick(&dashboard, transition.as_ref(), &Local));
        }

        tick += 1;
        if ticks.is_some_and(|limit| tick >= limit) {
            return Ok(());
        }
        thread::sleep(Duration::from_secs(interval_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cf_core::{ConsumptionEvent, EventId, Preferences, SubstanceId};
    use chrono::{DateTime, TimeZone, Utc};

    #[test]
    fn watcher_reports_changes_only() {
        let mut watcher = Watcher::default();
        assert_eq!(watcher.observe(GuidanceColor::Green), None);
        assert_eq!(watcher.observe(GuidanceColor::Green), None);

        let escalation = watcher.observe(GuidanceColor::Red).unwrap();
        assert!(escalation.is_escalation());
        assert_eq!(escalation.from, GuidanceColor::Green);

        let relief = watcher.observe(GuidanceColor::Yellow).unwrap();
        assert!(!relief.is_escalation());
    }

    #[test]
    fn tick_lines() {
        let now: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
        let event = ConsumptionEvent::new(
            EventId::new("a").unwrap(),
            SubstanceId::new("drip-coffee").unwrap(),
            "Drip coffee",
            95.0,
            now,
            now,
        )
        .unwrap();
        let dashboard = Engine::default().dashboard(&[event], &[], &Preferences::default(), &now);

        assert_eq!(
            format_tick(&dashboard, None, &Utc),
            "[09:30] GREEN  Good to go (95 mg now, 15 mg at bedtime)"
        );
        let transition = ColorTransition {
            from: GuidanceColor::Yellow,
            to: GuidanceColor::Green,
        };
        assert_eq!(
            format_tick(&dashboard, Some(&transition), &Utc),
            "[09:30] YELLOW -> GREEN  Good to go (95 mg now, 15 mg at bedtime)"
        );
    }

    #[test]
    fn stops_after_requested_ticks() {
        let db = Database::open_in_memory().expect("open in-memory db");
        run(&db, &Engine::default(), 0, Some(2)).unwrap();
    }
}
