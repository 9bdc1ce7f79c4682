//! Achievement badges.
//!
//! Each badge is an independent predicate re-evaluated from scratch on every
//! call. Remembering which badges the user has already been told about is the
//! caller's job; [`newly_earned`] does the diff.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checkin::{SleepCheckin, unique_by_date};
use crate::event::DoseEvent;
use crate::stats::TrackingStats;
use crate::types::{SleepQuality, ValidationError};

const TITAN_DAILY_MG: f64 = 400.0;
const TITAN_WEEK_DAYS: usize = 7;
const CHAMPION_GREAT_NIGHTS: usize = 5;
const RITUAL_MIN_DOSES: usize = 5;
const RITUAL_BEFORE_NOON_PCT: f64 = 90.0;
const STREAK_DAYS: u32 = 7;
const SCHOLAR_CHECKINS: usize = 5;

/// Badge identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeId {
    CaffeineTitan,
    SleepChampion,
    MorningRitual,
    WeekStreak,
    SleepScholar,
    Mixologist,
}

impl BadgeId {
    pub const ALL: [Self; 6] = [
        Self::CaffeineTitan,
        Self::SleepChampion,
        Self::MorningRitual,
        Self::WeekStreak,
        Self::SleepScholar,
        Self::Mixologist,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CaffeineTitan => "caffeine-titan",
            Self::SleepChampion => "sleep-champion",
            Self::MorningRitual => "morning-ritual",
            Self::WeekStreak => "week-streak",
            Self::SleepScholar => "sleep-scholar",
            Self::Mixologist => "mixologist",
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CaffeineTitan => "Caffeine Titan",
            Self::SleepChampion => "Sleep Champion",
            Self::MorningRitual => "Morning Ritual",
            Self::WeekStreak => "Week Streak",
            Self::SleepScholar => "Sleep Scholar",
            Self::Mixologist => "Mixologist",
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::CaffeineTitan => "Averaged 400 mg a day over a fully tracked week",
            Self::SleepChampion => "Reported five great nights of sleep",
            Self::MorningRitual => "Took 90% of a week's doses before noon",
            Self::WeekStreak => "Logged caffeine seven days in a row",
            Self::SleepScholar => "Completed five sleep check-ins",
            Self::Mixologist => "Logged a drink of your own",
        }
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BadgeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownBadge {
                value: s.to_string(),
            })
    }
}

/// A badge and whether it is currently earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

/// Evaluates every badge, in [`BadgeId::ALL`] order.
pub fn evaluate_badges<E: DoseEvent>(
    checkins: &[SleepCheckin],
    events: &[E],
    stats: &TrackingStats,
) -> Vec<Badge> {
    let checkins = unique_by_date(checkins);
    let great_nights = checkins
        .iter()
        .filter(|c| c.quality == SleepQuality::Great)
        .count();
    let has_manual = events.iter().any(|e| e.is_manual());

    let badges: Vec<Badge> = BadgeId::ALL
        .into_iter()
        .map(|id| {
            let earned = match id {
                BadgeId::CaffeineTitan => {
                    stats.week_days_tracked >= TITAN_WEEK_DAYS
                        && stats.week_avg_daily_mg >= TITAN_DAILY_MG
                }
                BadgeId::SleepChampion => great_nights >= CHAMPION_GREAT_NIGHTS,
                BadgeId::MorningRitual => {
                    stats.week_doses >= RITUAL_MIN_DOSES
                        && stats.week_before_noon_pct() >= RITUAL_BEFORE_NOON_PCT
                }
                BadgeId::WeekStreak => stats.current_streak_days >= STREAK_DAYS,
                BadgeId::SleepScholar => checkins.len() >= SCHOLAR_CHECKINS,
                BadgeId::Mixologist => has_manual,
            };
            Badge {
                id,
                name: id.name(),
                description: id.description(),
                earned,
            }
        })
        .collect();

    tracing::debug!(
        earned = badges.iter().filter(|b| b.earned).count(),
        "evaluated badges"
    );
    badges
}

/// Earned badges missing from the set the user has already seen.
pub fn newly_earned(seen: &HashSet<BadgeId>, badges: &[Badge]) -> Vec<BadgeId> {
    badges
        .iter()
        .filter(|b| b.earned && !seen.contains(&b.id))
        .map(|b| b.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    use crate::checkin::fixtures::checkin;
    use crate::event::fixtures::TestDose;

    fn stats() -> TrackingStats {
        TrackingStats {
            days_tracked: 3,
            current_streak_days: 3,
            longest_streak_days: 3,
            total_doses: 6,
            week_days_tracked: 3,
            week_avg_daily_mg: 120.0,
            week_doses: 6,
            week_before_noon_doses: 3,
            first_tracked: None,
        }
    }

    fn coffee() -> Vec<TestDose> {
        vec![TestDose::coffee(95.0, Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap())]
    }

    fn earned(badges: &[Badge], id: BadgeId) -> bool {
        badges.iter().any(|b| b.id == id && b.earned)
    }

    #[test]
    fn nothing_earned_for_a_new_user() {
        let empty: Vec<TestDose> = Vec::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
        let badges = evaluate_badges(&[], &empty, &TrackingStats::compute(&empty, &now));
        assert_eq!(badges.len(), BadgeId::ALL.len());
        assert!(badges.iter().all(|b| !b.earned));
    }

    #[test]
    fn caffeine_titan_needs_a_full_week() {
        let heavy = TrackingStats {
            week_days_tracked: 7,
            week_avg_daily_mg: 400.0,
            ..stats()
        };
        assert!(earned(&evaluate_badges(&[], &coffee(), &heavy), BadgeId::CaffeineTitan));

        let partial = TrackingStats {
            week_days_tracked: 6,
            week_avg_daily_mg: 500.0,
            ..stats()
        };
        assert!(!earned(&evaluate_badges(&[], &coffee(), &partial), BadgeId::CaffeineTitan));
    }

    #[test]
    fn sleep_champion_counts_great_nights() {
        let four: Vec<_> = (0..4).map(|d| checkin(d, SleepQuality::Great, 100.0)).collect();
        assert!(!earned(&evaluate_badges(&four, &coffee(), &stats()), BadgeId::SleepChampion));

        let five: Vec<_> = (0..5).map(|d| checkin(d, SleepQuality::Great, 100.0)).collect();
        assert!(earned(&evaluate_badges(&five, &coffee(), &stats()), BadgeId::SleepChampion));
    }

    #[test]
    fn morning_ritual_needs_samples_and_share() {
        let ritual = TrackingStats {
            week_doses: 10,
            week_before_noon_doses: 9,
            ..stats()
        };
        assert!(earned(&evaluate_badges(&[], &coffee(), &ritual), BadgeId::MorningRitual));

        let too_few = TrackingStats {
            week_doses: 4,
            week_before_noon_doses: 4,
            ..stats()
        };
        assert!(!earned(&evaluate_badges(&[], &coffee(), &too_few), BadgeId::MorningRitual));
    }

    #[test]
    fn week_streak() {
        let streak = TrackingStats {
            current_streak_days: 7,
            ..stats()
        };
        assert!(earned(&evaluate_badges(&[], &coffee(), &streak), BadgeId::WeekStreak));
        assert!(!earned(&evaluate_badges(&[], &coffee(), &stats()), BadgeId::WeekStreak));
    }

    #[test]
    fn sleep_scholar_ignores_duplicate_dates() {
        let mut checkins: Vec<_> = (0..4).map(|d| checkin(d, SleepQuality::Ok, 100.0)).collect();
        checkins.push(checkin(0, SleepQuality::Poor, 100.0));
        assert!(!earned(&evaluate_badges(&checkins, &coffee(), &stats()), BadgeId::SleepScholar));

        checkins.push(checkin(4, SleepQuality::Poor, 100.0));
        assert!(earned(&evaluate_badges(&checkins, &coffee(), &stats()), BadgeId::SleepScholar));
    }

    #[test]
    fn mixologist_needs_a_manual_drink() {
        assert!(!earned(&evaluate_badges(&[], &coffee(), &stats()), BadgeId::Mixologist));

        let mut events = coffee();
        events.push(TestDose::manual(40.0, Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()));
        assert!(earned(&evaluate_badges(&[], &events, &stats()), BadgeId::Mixologist));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let checkins: Vec<_> = (0..5).map(|d| checkin(d, SleepQuality::Great, 100.0)).collect();
        let first = evaluate_badges(&checkins, &coffee(), &stats());
        let second = evaluate_badges(&checkins, &coffee(), &stats());
        assert_eq!(first, second);
    }

    #[test]
    fn newly_earned_skips_seen() {
        let checkins: Vec<_> = (0..5).map(|d| checkin(d, SleepQuality::Great, 100.0)).collect();
        let badges = evaluate_badges(&checkins, &coffee(), &stats());

        let none_seen = newly_earned(&HashSet::new(), &badges);
        assert_eq!(none_seen, vec![BadgeId::SleepChampion, BadgeId::SleepScholar]);

        let seen: HashSet<_> = [BadgeId::SleepScholar].into_iter().collect();
        assert_eq!(newly_earned(&seen, &badges), vec![BadgeId::SleepChampion]);
    }

    #[test]
    fn badge_id_round_trips_through_str() {
        for id in BadgeId::ALL {
            assert_eq!(id.as_str().parse::<BadgeId>().unwrap(), id);
        }
        assert!("unknown".parse::<BadgeId>().is_err());
    }
}
