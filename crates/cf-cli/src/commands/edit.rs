//! Edit command for correcting a logged dose.

use anyhow::{Context, Result};
use cf_core::ConsumptionEvent;
use cf_db::Database;
use chrono::{DateTime, Local, Utc};

use super::util::{format_clock, parse_datetime};

/// Applies an edit, refusing a no-op.
pub fn apply_edit(
    event: &ConsumptionEvent,
    mg: Option<f64>,
    at: Option<DateTime<Utc>>,
) -> Result<ConsumptionEvent> {
    if mg.is_none() && at.is_none() {
        anyhow::bail!("Nothing to change. Pass --mg and/or --at.");
    }
    Ok(event.edited(mg, at)?)
}

/// Runs the edit command.
pub fn run(db: &Database, id: &str, mg: Option<f64>, at: Option<&str>) -> Result<()> {
    let now = Local::now();
    let at = at.map(|s| parse_datetime(s, &now)).transpose()?;

    let Some(event) = db.get_event(id).context("failed to read dose")? else {
        anyhow::bail!("No dose with ID {id}");
    };
    let updated = apply_edit(&event, mg, at)?;
    db.update_event(&updated).context("failed to update dose")?;

    println!(
        "Updated {}: {:.0} mg at {}.",
        updated.display_name,
        updated.caffeine_mg,
        format_clock(updated.consumed_at, &Local)
    );
    Ok(())
}
