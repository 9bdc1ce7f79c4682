//! Guidance: whether another dose is a good idea right now.
//!
//! Two independent risk axes feed one state:
//!
//! - jitter: one more estimated dose would reach the stacking ceiling
//! - sleep: the bedtime forecast is medium or high
//!
//! The result is a pure function of a [`CaffeineStatus`] and [`Thresholds`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::status::{CaffeineStatus, SleepRisk};
use crate::thresholds::Thresholds;

/// Combined guidance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceState {
    Safe,
    JitterRisk,
    SleepRisk,
    BothRisks,
}

impl GuidanceState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::JitterRisk => "jitter_risk",
            Self::SleepRisk => "sleep_risk",
            Self::BothRisks => "both_risks",
        }
    }

    const fn from_axes(jitter: bool, sleep: bool) -> Self {
        match (jitter, sleep) {
            (true, true) => Self::BothRisks,
            (true, false) => Self::JitterRisk,
            (false, true) => Self::SleepRisk,
            (false, false) => Self::Safe,
        }
    }
}

impl fmt::Display for GuidanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Traffic-light color shown alongside guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidanceColor {
    Green,
    Yellow,
    Red,
}

impl GuidanceColor {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    const fn severity(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Yellow => 1,
            Self::Red => 2,
        }
    }
}

impl fmt::Display for GuidanceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Guidance derived from one status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    pub state: GuidanceState,
    pub color: GuidanceColor,
    /// Present only when a risk is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time_hours: Option<f64>,
    pub headline: String,
    pub message: String,
    /// Sleep risk shapes the copy but never blocks a dose.
    pub is_safe_for_next_dose: bool,
}

/// Maps a status snapshot to guidance.
///
/// The jitter axis is recomputed from `status.current_level_mg` so the result
/// depends only on the arguments. The wait time is the jitter wait, the time
/// the bedtime forecast needs to clear past bedtime, or the larger of the two.
pub fn compute_guidance(status: &CaffeineStatus, thresholds: &Thresholds) -> Guidance {
    let current = f64::from(status.current_level_mg);
    let projected = f64::from(status.projected_at_bedtime_mg);

    let jitter_wait = thresholds.jitter_wait_hours(current);
    let sleep_active = status.sleep_risk != SleepRisk::Low;
    let state = GuidanceState::from_axes(jitter_wait.is_some(), sleep_active);

    let color = match state {
        GuidanceState::Safe => GuidanceColor::Green,
        GuidanceState::BothRisks => GuidanceColor::Red,
        _ if status.sleep_risk == SleepRisk::High => GuidanceColor::Red,
        GuidanceState::JitterRisk | GuidanceState::SleepRisk => GuidanceColor::Yellow,
    };

    let sleep_wait = sleep_active.then(|| thresholds.sleep_clear_hours(projected));
    let wait_time_hours = match (jitter_wait, sleep_wait) {
        (Some(j), Some(s)) => Some(j.max(s)),
        (j, s) => j.or(s),
    };

    let (headline, message) = copy(state, status, thresholds, wait_time_hours);

    tracing::debug!(state = %state, color = %color, ?wait_time_hours, "computed guidance");

    Guidance {
        state,
        color,
        wait_time_hours,
        headline,
        message,
        is_safe_for_next_dose: jitter_wait.is_none(),
    }
}

fn copy(
    state: GuidanceState,
    status: &CaffeineStatus,
    thresholds: &Thresholds,
    wait: Option<f64>,
) -> (String, String) {
    let current = status.current_level_mg;
    let projected = status.projected_at_bedtime_mg;
    let wait = format_wait(wait.unwrap_or(0.0));
    match state {
        GuidanceState::Safe => (
            "Good to go".to_string(),
            format!(
                "You're at {current} mg. Another cup fits comfortably and should clear before bed."
            ),
        ),
        GuidanceState::JitterRisk => (
            "Hold off for now".to_string(),
            format!(
                "You're at {current} mg. Another {next:.0} mg would take you past {jitter:.0} mg. Give it {wait}.",
                next = thresholds.next_dose_estimate_mg,
                jitter = thresholds.jitter_threshold_mg,
            ),
        ),
        GuidanceState::SleepRisk => (
            "Mind your bedtime".to_string(),
            format!(
                "About {projected} mg will still be active at bedtime ({risk} sleep risk). It needs {wait} more to clear.",
                risk = status.sleep_risk,
            ),
        ),
        GuidanceState::BothRisks => (
            "Time for a break".to_string(),
            format!(
                "You're at {current} mg and about {projected} mg will remain at bedtime. Skip caffeine for {wait}."
            ),
        ),
    }
}

/// Formats a duration in hours as `1h 05m`, `45m` or `0m`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_wait(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0m".to_string();
    }
    let minutes = (hours * 60.0).ceil() as u64;
    if minutes < 60 {
        format!("{minutes}m")
    } else {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    }
}

/// A change of guidance color between two evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorTransition {
    pub from: GuidanceColor,
    pub to: GuidanceColor,
}

impl ColorTransition {
    /// Returns the transition if the color changed.
    ///
    /// The first evaluation (`previous == None`) is not a transition.
    pub fn between(previous: Option<GuidanceColor>, next: GuidanceColor) -> Option<Self> {
        match previous {
            Some(from) if from != next => Some(Self { from, to: next }),
            _ => None,
        }
    }

    /// True when the new color is more severe.
    pub const fn is_escalation(&self) -> bool {
        self.to.severity() > self.from.severity()
    }
}
