//! Validated entry point tying the classifiers together.

use chrono::{DateTime, Days, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::checkin::SleepCheckin;
use crate::clock::local_midnight;
use crate::event::{ConsumptionEvent, DoseEvent};
use crate::guidance::{Guidance, compute_guidance};
use crate::pattern::{ConsumptionPattern, DEFAULT_WINDOW_DAYS, analyze_patterns};
use crate::preferences::Preferences;
use crate::profile::{CaffeineProfile, build_profile};
use crate::sensitivity::{SensitivityResult, infer_sensitivity};
use crate::source::{CheckinSource, EventSource, PreferenceSource};
use crate::status::{CaffeineStatus, compute_status};
use crate::thresholds::{ConfigError, Thresholds};

/// How far back the status fetches doses for the decay tail.
pub const STATUS_LOOKBACK_HOURS: i64 = 48;

/// Real-time view: status plus guidance, under sensitivity-tiered thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub status: CaffeineStatus,
    pub guidance: Guidance,
    pub sensitivity: SensitivityResult,
    /// Thresholds after tiering.
    pub thresholds: Thresholds,
}

/// Engine configuration, validated once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    thresholds: Thresholds,
    window_days: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl Engine {
    /// Creates an engine, rejecting unusable configuration.
    pub fn new(thresholds: Thresholds, window_days: u32) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        if window_days == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        Ok(Self {
            thresholds,
            window_days,
        })
    }

    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub const fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Status and guidance at `now`.
    pub fn dashboard<E: DoseEvent, Tz: TimeZone>(
        &self,
        events: &[E],
        checkins: &[SleepCheckin],
        preferences: &Preferences,
        now: &DateTime<Tz>,
    ) -> Dashboard {
        let sensitivity = infer_sensitivity(checkins, preferences.sensitivity);
        let thresholds = self.thresholds.for_sensitivity(sensitivity.level);
        let status = compute_status(
            events,
            now,
            preferences.bedtime,
            preferences.daily_limit_mg,
            &thresholds,
        );
        let guidance = compute_guidance(&status, &thresholds);
        Dashboard {
            status,
            guidance,
            sensitivity,
            thresholds,
        }
    }

    pub fn patterns<E: DoseEvent, Tz: TimeZone>(
        &self,
        events: &[E],
        now: &DateTime<Tz>,
    ) -> ConsumptionPattern {
        analyze_patterns(events, now, self.window_days)
    }

    pub fn profile<E: DoseEvent, Tz: TimeZone>(
        &self,
        events: &[E],
        checkins: &[SleepCheckin],
        preferences: &Preferences,
        now: &DateTime<Tz>,
    ) -> CaffeineProfile {
        build_profile(events, checkins, now, preferences.sensitivity, self.window_days)
    }

    /// Reads the status window from a store and builds the dashboard.
    pub fn load_dashboard<S, Er, Tz>(&self, store: &S, now: &DateTime<Tz>) -> Result<Dashboard, Er>
    where
        S: EventSource<Error = Er> + CheckinSource<Error = Er> + PreferenceSource<Error = Er>,
        Tz: TimeZone,
    {
        let (start, end) = status_window(now);
        let events: Vec<ConsumptionEvent> = store.events_between(start, end)?;
        let checkins = store.checkins()?;
        let preferences = store.preferences()?;
        Ok(self.dashboard(&events, &checkins, &preferences, now))
    }

    /// Reads the full history from a store and builds the profile.
    pub fn load_profile<S, Er, Tz>(
        &self,
        store: &S,
        now: &DateTime<Tz>,
    ) -> Result<CaffeineProfile, Er>
    where
        S: EventSource<Error = Er> + CheckinSource<Error = Er> + PreferenceSource<Error = Er>,
        Tz: TimeZone,
    {
        let events = store.all_events()?;
        let checkins = store.checkins()?;
        let preferences = store.preferences()?;
        Ok(self.profile(&events, &checkins, &preferences, now))
    }
}

/// Dose range the status needs: the decay tail up to the end of tomorrow,
/// which covers any bedtime after midnight.
pub fn status_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.with_timezone(&Utc) - Duration::hours(STATUS_LOOKBACK_HOURS);
    let end = now
        .date_naive()
        .checked_add_days(Days::new(2))
        .map_or(DateTime::<Utc>::MAX_UTC, |d| local_midnight(&now.timezone(), d));
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::convert::Infallible;

    use chrono::NaiveDate;

    use crate::guidance::GuidanceState;
    use crate::sensitivity::{SensitivityLevel, SensitivityPreference};
    use crate::types::{EventId, SleepQuality, SubstanceId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 15, 0, 0).unwrap()
    }

    fn event(id: &str, mg: f64, at: DateTime<Utc>) -> ConsumptionEvent {
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

    struct MemoryStore {
        events: Vec<ConsumptionEvent>,
        checkins: Vec<SleepCheckin>,
        preferences: Preferences,
        range_queries: Cell<usize>,
    }

    impl EventSource for MemoryStore {
        type Error = Infallible;

        fn all_events(&self) -> Result<Vec<ConsumptionEvent>, Infallible> {
            Ok(self.events.clone())
        }

        fn events_between(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<ConsumptionEvent>, Infallible> {
            self.range_queries.set(self.range_queries.get() + 1);
            Ok(self
                .events
                .iter()
                .filter(|e| e.consumed_at >= start && e.consumed_at < end)
                .cloned()
                .collect())
        }
    }

    impl CheckinSource for MemoryStore {
        type Error = Infallible;

        fn checkins(&self) -> Result<Vec<SleepCheckin>, Infallible> {
            Ok(self.checkins.clone())
        }
    }

    impl PreferenceSource for MemoryStore {
        type Error = Infallible;

        fn preferences(&self) -> Result<Preferences, Infallible> {
            Ok(self.preferences)
        }
    }

    fn high_sensitivity_checkins() -> Vec<SleepCheckin> {
        (0..5)
            .map(|d| {
                let date = NaiveDate::from_ymd_opt(2025, 1, 1 + d).unwrap();
                let quality = if d % 2 == 0 {
                    SleepQuality::Poor
                } else {
                    SleepQuality::Ok
                };
                SleepCheckin::new(date, quality, 350.0, Some(17), now()).unwrap()
            })
            .collect()
    }

    #[test]
    fn rejects_invalid_configuration() {
        let bad = Thresholds {
            half_life_hours: -1.0,
            ..Thresholds::default()
        };
        assert!(Engine::new(bad, 30).is_err());
        assert_eq!(
            Engine::new(Thresholds::default(), 0),
            Err(ConfigError::EmptyWindow)
        );
        assert!(Engine::new(Thresholds::default(), 30).is_ok());
    }

    #[test]
    fn dashboard_applies_sensitivity_tier() {
        let engine = Engine::default();
        let events = vec![event("a", 200.0, now())];
        let prefs = Preferences::default();

        let relaxed = engine.dashboard(&events, &[], &prefs, &now());
        assert_eq!(relaxed.sensitivity.level, SensitivityLevel::Unknown);
        assert_eq!(relaxed.guidance.state, GuidanceState::SleepRisk);
        assert!(relaxed.guidance.is_safe_for_next_dose);

        let strict = engine.dashboard(&events, &high_sensitivity_checkins(), &prefs, &now());
        assert_eq!(strict.sensitivity.level, SensitivityLevel::High);
        assert!((strict.thresholds.jitter_threshold_mg - 200.0).abs() < f64::EPSILON);
        assert_eq!(strict.guidance.state, GuidanceState::BothRisks);
    }

    #[test]
    fn override_pins_the_tier() {
        let engine = Engine::default();
        let prefs = Preferences {
            sensitivity: SensitivityPreference::Low,
            ..Preferences::default()
        };
        let dashboard = engine.dashboard(
            &[event("a", 95.0, now())],
            &high_sensitivity_checkins(),
            &prefs,
            &now(),
        );
        assert_eq!(dashboard.sensitivity.level, SensitivityLevel::Low);
        assert!((dashboard.thresholds.sleep_safe_mg - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_dashboard_queries_the_status_window() {
        let store = MemoryStore {
            events: vec![
                event("old", 400.0, now() - Duration::days(5)),
                event("recent", 95.0, now() - Duration::hours(1)),
            ],
            checkins: Vec::new(),
            preferences: Preferences::default(),
            range_queries: Cell::new(0),
        };
        let engine = Engine::default();
        let Ok(dashboard) = engine.load_dashboard(&store, &now());
        assert_eq!(store.range_queries.get(), 1);
        assert_eq!(dashboard.status.daily_consumed_mg, 95);
    }

    #[test]
    fn load_profile_reads_full_history() {
        let store = MemoryStore {
            events: (0..7)
                .map(|d| event(&format!("e{d}"), 95.0, now() - Duration::days(d)))
                .collect(),
            checkins: Vec::new(),
            preferences: Preferences::default(),
            range_queries: Cell::new(0),
        };
        let Ok(profile) = Engine::default().load_profile(&store, &now());
        assert!(profile.is_unlocked);
        assert_eq!(store.range_queries.get(), 0);
    }

    #[test]
    fn status_window_covers_tail_and_tomorrow() {
        let (start, end) = status_window(&now());
        assert_eq!(start, now() - Duration::hours(48));
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 17, 0, 0, 0).unwrap());
    }
}
