//! Log command for recording a dose.

use std::fmt::Write;

use anyhow::{Context, Result};
use cf_core::catalog::{self, MANUAL_SUBSTANCE_ID};
use cf_core::{ConsumptionEvent, Dashboard, Engine, EventId, SubstanceId, format_wait};
use cf_db::Database;
use chrono::{DateTime, Local, TimeZone, Utc};
use uuid::Uuid;

use super::util::{format_clock, parse_datetime};

/// Display name for manual entries logged without `--name`.
const DEFAULT_MANUAL_NAME: &str = "Custom drink";

/// Builds the event for a `cf log` invocation.
///
/// A catalog drink supplies the substance, name and default amount; `mg`
/// and `name` override them. Without a drink the entry is manual and `mg`
/// is required.
pub fn build_event(
    id: EventId,
    drink: Option<&str>,
    mg: Option<f64>,
    name: Option<&str>,
    consumed_at: DateTime<Utc>,
    logged_at: DateTime<Utc>,
) -> Result<ConsumptionEvent> {
    let (substance_id, display_name, caffeine_mg) = match drink {
        Some(drink_id) => {
            let Some(drink) = catalog::lookup(drink_id) else {
                anyhow::bail!("Unknown drink: {drink_id}. Run 'cf drinks' to list the catalog.");
            };
            (
                drink.id,
                name.unwrap_or(drink.name),
                mg.unwrap_or(drink.caffeine_mg),
            )
        }
        None => {
            let Some(mg) = mg else {
                anyhow::bail!("Pass --drink <id> or --mg <amount>.");
            };
            (MANUAL_SUBSTANCE_ID, name.unwrap_or(DEFAULT_MANUAL_NAME), mg)
        }
    };

    let event = ConsumptionEvent::new(
        id,
        SubstanceId::new(substance_id)?,
        display_name,
        caffeine_mg,
        consumed_at,
        logged_at,
    )?;
    Ok(event)
}

/// Confirmation printed after logging.
pub fn format_logged<Tz: TimeZone>(
    event: &ConsumptionEvent,
    dashboard: &Dashboard,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut output = String::new();

    writeln!(
        output,
        "Logged {} ({:.0} mg) at {}.",
        event.display_name,
        event.caffeine_mg,
        format_clock(event.consumed_at, tz)
    )
    .unwrap();
    writeln!(output, "ID: {}", event.id).unwrap();

    let guidance = &dashboard.guidance;
    write!(
        output,
        "Now at {} mg. {}",
        dashboard.status.current_level_mg, guidance.headline
    )
    .unwrap();
    if let Some(wait) = guidance.wait_time_hours {
        write!(output, " (wait {})", format_wait(wait)).unwrap();
    }
    writeln!(output, ".").unwrap();

    output
}

/// Runs the log command.
pub fn run(
    db: &Database,
    engine: &Engine,
    drink: Option<&str>,
    mg: Option<f64>,
    name: Option<&str>,
    at: Option<&str>,
) -> Result<()> {
    let now = Local::now();
    let consumed_at = match at {
        Some(at) => parse_datetime(at, &now)?,
        None => now.with_timezone(&Utc),
    };

    let id = EventId::new(Uuid::new_v4().to_string())?;
    let event = build_event(id, drink, mg, name, consumed_at, Utc::now())?;
    db.insert_event(&event).context("failed to log dose")?;
    tracing::debug!(id = %event.id, mg = event.caffeine_mg, "logged dose");

    let dashboard = engine
        .load_dashboard(db, &now)
        .context("failed to compute status")?;
    print!("{}", format_logged(&event, &dashboard, &Local));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use cf_core::Preferences;
    use insta::assert_snapshot;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
    }

    fn id() -> EventId {
        EventId::new("evt-1").unwrap()
    }

    #[test]
    fn catalog_drink_supplies_defaults() {
        let event = build_event(id(), Some("espresso"), None, None, at(), at()).unwrap();
        assert_eq!(event.substance_id.as_str(), "espresso");
        assert_eq!(event.display_name, "Espresso");
        assert!((event.caffeine_mg - 63.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overrides_apply_to_catalog_drink() {
        let event = build_event(
            id(),
            Some("drip-coffee"),
            Some(140.0),
            Some("Big mug"),
            at(),
            at(),
        )
        .unwrap();
        assert_eq!(event.substance_id.as_str(), "drip-coffee");
        assert_eq!(event.display_name, "Big mug");
        assert!((event.caffeine_mg - 140.0).abs() < f64::EPSILON);
    }

    #[test]
    fn manual_entry_needs_amount() {
        let event = build_event(id(), None, Some(50.0), None, at(), at()).unwrap();
        assert_eq!(event.substance_id.as_str(), MANUAL_SUBSTANCE_ID);
        assert_eq!(event.display_name, "Custom drink");

        assert!(build_event(id(), None, None, None, at(), at()).is_err());
    }

    #[test]
    fn rejects_unknown_drink_and_bad_amount() {
        let err = build_event(id(), Some("mate"), None, None, at(), at()).unwrap_err();
        assert!(err.to_string().contains("cf drinks"));
        assert!(build_event(id(), None, Some(-5.0), None, at(), at()).is_err());
        assert!(build_event(id(), None, Some(f64::NAN), None, at(), at()).is_err());
    }

    #[test]
    fn confirmation_includes_guidance() {
        let event = build_event(id(), Some("drip-coffee"), None, None, at(), at()).unwrap();
        let dashboard =
            Engine::default().dashboard(&[event.clone()], &[], &Preferences::default(), &at());
        let output = format_logged(&event, &dashboard, &Utc);
        assert_snapshot!(output, @r"
        Logged Drip coffee (95 mg) at 09:30.
        ID: evt-1
        Now at 95 mg. Good to go.
        ");
    }
}
