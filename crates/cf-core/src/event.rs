//! Consumption events: one logged dose each.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::decay::sanitize_mg;
use crate::types::{EventId, SubstanceId, ValidationError};

/// A dose suitable for the kinetics engine.
///
/// This trait allows the engine to work with different event representations
/// (e.g., rows from cf-db, or test fixtures).
pub trait DoseEvent {
    /// Amount of caffeine in mg. May be malformed; the engine sanitizes it.
    fn caffeine_mg(&self) -> f64;

    /// When the dose was actually ingested.
    fn consumed_at(&self) -> DateTime<Utc>;

    /// Substance identifier (catalog ID or a manual one).
    fn substance_id(&self) -> &str;

    /// Returns true if this dose was typed in rather than picked from the catalog.
    fn is_manual(&self) -> bool {
        !catalog::is_catalog(self.substance_id())
    }
}

/// One logged dose.
///
/// Immutable once created; [`ConsumptionEvent::edited`] yields the replacement
/// for an explicit edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEvent {
    /// Unique identifier for this dose.
    pub id: EventId,
    /// Catalog or manual substance ID.
    pub substance_id: SubstanceId,
    /// Name shown to the user.
    pub display_name: String,
    /// Caffeine content in mg.
    pub caffeine_mg: f64,
    /// When the dose was ingested.
    pub consumed_at: DateTime<Utc>,
    /// When the dose was recorded.
    pub logged_at: DateTime<Utc>,
}

impl ConsumptionEvent {
    /// Creates a dose after validating the amount.
    pub fn new(
        id: EventId,
        substance_id: SubstanceId,
        display_name: impl Into<String>,
        caffeine_mg: f64,
        consumed_at: DateTime<Utc>,
        logged_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let caffeine_mg =
            sanitize_mg(caffeine_mg).ok_or(ValidationError::InvalidAmount { value: caffeine_mg })?;
        Ok(Self {
            id,
            substance_id,
            display_name: display_name.into(),
            caffeine_mg,
            consumed_at,
            logged_at,
        })
    }

    /// Returns the replacement event for an edit of amount and/or time.
    pub fn edited(
        &self,
        caffeine_mg: Option<f64>,
        consumed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            self.id.clone(),
            self.substance_id.clone(),
            self.display_name.clone(),
            caffeine_mg.unwrap_or(self.caffeine_mg),
            consumed_at.unwrap_or(self.consumed_at),
            self.logged_at,
        )
    }
}

impl DoseEvent for ConsumptionEvent {
    fn caffeine_mg(&self) -> f64 {
        self.caffeine_mg
    }

    fn consumed_at(&self) -> DateTime<Utc> {
        self.consumed_at
    }

    fn substance_id(&self) -> &str {
        self.substance_id.as_str()
    }
}

/// A sanitized dose: timestamp plus a clean amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Dose {
    pub at: DateTime<Utc>,
    pub mg: f64,
}

/// Copies the usable doses out of `events`, sorted by consumption time.
///
/// Records with malformed amounts are dropped with a warning; the input is
/// never mutated.
pub(crate) fn sorted_doses<E: DoseEvent>(events: &[E]) -> Vec<Dose> {
    let mut doses: Vec<Dose> = events
        .iter()
        .filter_map(|e| {
            let raw = e.caffeine_mg();
            let Some(mg) = sanitize_mg(raw) else {
                tracing::warn!(
                    substance = e.substance_id(),
                    consumed_at = %e.consumed_at(),
                    mg = raw,
                    "ignoring dose with malformed caffeine amount"
                );
                return None;
            };
            Some(Dose {
                at: e.consumed_at(),
                mg,
            })
        })
        .collect();
    doses.sort_by_key(|d| d.at);
    doses
}
