//! Collaborator contracts the engine reads from.
//!
//! Storage lives outside the engine. These traits describe what a store
//! must provide; `cf-db` implements them over SQLite.

use chrono::{DateTime, Utc};

use crate::checkin::SleepCheckin;
use crate::event::ConsumptionEvent;
use crate::preferences::Preferences;

/// Source of logged doses.
pub trait EventSource {
    type Error;

    /// Every logged dose.
    fn all_events(&self) -> Result<Vec<ConsumptionEvent>, Self::Error>;

    /// Doses consumed in `[start, end)`.
    fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ConsumptionEvent>, Self::Error>;
}

/// Source of sleep check-ins.
pub trait CheckinSource {
    type Error;

    fn checkins(&self) -> Result<Vec<SleepCheckin>, Self::Error>;
}

/// Source of user preferences.
pub trait PreferenceSource {
    type Error;

    /// Stored preferences, with defaults for anything unset.
    fn preferences(&self) -> Result<Preferences, Self::Error>;
}
