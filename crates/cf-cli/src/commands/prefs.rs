//! Prefs command for bedtime, daily limit and sensitivity.

use std::fmt::Write;

use anyhow::{Context, Result};
use cf_core::{Preferences, SensitivityPreference, format_time_of_day, parse_time_of_day};
use cf_db::Database;

/// Requested preference changes; `None` leaves a value alone.
#[derive(Debug, Default)]
pub struct PrefsUpdate<'a> {
    pub bedtime: Option<&'a str>,
    pub daily_limit_mg: Option<u32>,
    pub sensitivity: Option<&'a str>,
}

impl PrefsUpdate<'_> {
    pub const fn is_empty(&self) -> bool {
        self.bedtime.is_none() && self.daily_limit_mg.is_none() && self.sensitivity.is_none()
    }

    /// Validates every field before applying any of them.
    pub fn apply(&self, prefs: &Preferences) -> Result<Preferences> {
        let mut updated = *prefs;
        if let Some(bedtime) = self.bedtime {
            updated.bedtime = parse_time_of_day(bedtime)?;
        }
        if let Some(limit) = self.daily_limit_mg {
            updated.daily_limit_mg = limit;
        }
        if let Some(sensitivity) = self.sensitivity {
            updated.sensitivity = sensitivity.parse::<SensitivityPreference>()?;
        }
        Ok(updated)
    }
}

/// Format preferences for human-readable output.
pub fn format_prefs(prefs: &Preferences) -> String {
    let mut output = String::new();
    writeln!(output, "{:<12}  {}", "Bedtime", format_time_of_day(prefs.bedtime)).unwrap();
    writeln!(output, "{:<12}  {} mg", "Daily limit", prefs.daily_limit_mg).unwrap();
    writeln!(output, "{:<12}  {}", "Sensitivity", prefs.sensitivity).unwrap();
    output
}

/// Runs the prefs command.
pub fn run(db: &mut Database, update: &PrefsUpdate<'_>) -> Result<()> {
    let prefs = db.load_preferences().context("failed to read preferences")?;

    let prefs = if update.is_empty() {
        prefs
    } else {
        let updated = update.apply(&prefs)?;
        db.store_preferences(&updated)
            .context("failed to save preferences")?;
        tracing::debug!(?updated, "stored preferences");
        updated
    };

    print!("{}", format_prefs(&prefs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use cf_core::DEFAULT_DAILY_LIMIT_MG;
    use insta::assert_snapshot;

    #[test]
    fn test_default_prefs() {
        assert_snapshot!(format_prefs(&Preferences::default()), @r"
        Bedtime       23:00
        Daily limit   400 mg
        Sensitivity   auto
        ");
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let update = PrefsUpdate {
            bedtime: Some("22:30"),
            ..PrefsUpdate::default()
        };
        let prefs = update.apply(&Preferences::default()).unwrap();
        assert_eq!(format_time_of_day(prefs.bedtime), "22:30");
        assert_eq!(prefs.daily_limit_mg, DEFAULT_DAILY_LIMIT_MG);
        assert_eq!(prefs.sensitivity, SensitivityPreference::Auto);
    }

    #[test]
    fn invalid_value_rejects_whole_update() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let update = PrefsUpdate {
            daily_limit_mg: Some(200),
            sensitivity: Some("extreme"),
            ..PrefsUpdate::default()
        };
        assert!(run(&mut db, &update).is_err());
        assert_eq!(db.load_preferences().unwrap(), Preferences::default());
    }

    #[test]
    fn update_is_persisted() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let update = PrefsUpdate {
            bedtime: Some("00:30"),
            daily_limit_mg: Some(300),
            sensitivity: Some("high"),
        };
        run(&mut db, &update).unwrap();

        let stored = db.load_preferences().unwrap();
        assert_eq!(format_time_of_day(stored.bedtime), "00:30");
        assert_eq!(stored.daily_limit_mg, 300);
        assert_eq!(stored.sensitivity, SensitivityPreference::High);
    }
}
