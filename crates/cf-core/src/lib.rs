//! Caffeine kinetics and guidance engine.
//!
//! This crate turns a snapshot of logged doses and sleep check-ins into:
//! - Status: the live decaying level, today's peak and the bedtime forecast
//! - Guidance: whether another dose is safe right now, and how long to wait
//! - Patterns, personality, badges and sensitivity over a rolling window
//!
//! Every computation is a pure function of its inputs, including `now`.
//! Storage is reached only through the traits in [`source`].

pub mod badges;
pub mod catalog;
mod checkin;
pub mod clock;
pub mod decay;
mod engine;
mod event;
mod guidance;
mod pattern;
mod personality;
mod preferences;
mod profile;
mod sensitivity;
pub mod source;
mod stats;
mod status;
mod thresholds;
mod types;

pub use badges::{Badge, BadgeId, evaluate_badges, newly_earned};
pub use checkin::{DaySummary, SleepCheckin, unique_by_date};
pub use decay::{DecayParameters, remaining};
pub use engine::{Dashboard, Engine, STATUS_LOOKBACK_HOURS, status_window};
pub use event::{ConsumptionEvent, DoseEvent};
pub use guidance::{
    ColorTransition, Guidance, GuidanceColor, GuidanceState, compute_guidance, format_wait,
};
pub use pattern::{ConsumptionPattern, DEFAULT_WINDOW_DAYS, analyze_patterns};
pub use personality::{ConsumptionLevel, PersonalityTag, classify_personality};
pub use preferences::{
    DEFAULT_DAILY_LIMIT_MG, Preferences, format_time_of_day, parse_time_of_day,
};
pub use profile::{CaffeineProfile, UNLOCK_DAYS, build_profile};
pub use sensitivity::{
    MIN_CHECKINS, SensitivityLevel, SensitivityPreference, SensitivityResult, SensitivitySource,
    infer_sensitivity,
};
pub use source::{CheckinSource, EventSource, PreferenceSource};
pub use stats::TrackingStats;
pub use status::{CaffeineStatus, SleepRisk, compute_status};
pub use thresholds::{ConfigError, Thresholds};
pub use types::{EventId, SleepQuality, SubstanceId, ValidationError};
