use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a learner stands relative to today, before a qualifying activity.
///
/// Every transition ends in `ActiveToday`; only `ActiveToday` re-enters
/// itself without touching the streak value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakState {
    /// No progress record exists yet.
    NoRecord,
    /// Last activity happened today.
    ActiveToday,
    /// Last activity happened yesterday; the streak continues.
    ActiveYesterday,
    /// Last activity is older than yesterday, missing, or in the future.
    Stale,
}

impl StreakState {
    /// Classifies the last activity date of an existing record against `today`.
    ///
    /// A date after `today` (clock skew between devices) is treated as stale.
    #[must_use]
    pub fn classify(today: NaiveDate, last: Option<NaiveDate>) -> Self {
        let Some(last) = last else {
            return Self::Stale;
        };
        if last == today {
            Self::ActiveToday
        } else if Some(last) == yesterday(today) {
            Self::ActiveYesterday
        } else {
            Self::Stale
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoRecord => "no_record",
            Self::ActiveToday => "active_today",
            Self::ActiveYesterday => "active_yesterday",
            Self::Stale => "stale",
        }
    }
}

fn yesterday(today: NaiveDate) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(1))
}

//
// ─── RULE ──────────────────────────────────────────────────────────────────────
//

/// The persisted pair a streak decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStamp {
    pub streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}

impl StreakStamp {
    #[must_use]
    pub fn new(streak: u32, last_activity_date: Option<NaiveDate>) -> Self {
        Self {
            streak,
            last_activity_date,
        }
    }
}

/// Result of applying the streak rule for one qualifying activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    previous: StreakState,
    streak: u32,
    today: NaiveDate,
}

impl StreakUpdate {
    /// State the learner was in before this activity.
    #[must_use]
    pub fn previous_state(&self) -> StreakState {
        self.previous
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Always the day the rule was applied on.
    #[must_use]
    pub fn last_activity_date(&self) -> NaiveDate {
        self.today
    }

    #[must_use]
    pub fn stamp(&self) -> StreakStamp {
        StreakStamp::new(self.streak, Some(self.today))
    }

    /// True when the streak grew by one.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.previous == StreakState::ActiveYesterday
    }

    /// True when the activity changed the stored streak value.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != StreakState::ActiveToday
    }
}

/// Daily streak rule.
///
/// Pure in `(today, previous)`: calling it any number of times with the same
/// inputs gives the same answer.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use lingo_core::streak::{StreakRule, StreakStamp, StreakState};
/// let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// let yesterday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
///
/// let update = StreakRule::apply(today, Some(StreakStamp::new(4, Some(yesterday))));
/// assert_eq!(update.streak(), 5);
/// assert_eq!(update.previous_state(), StreakState::ActiveYesterday);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakRule;

impl StreakRule {
    #[must_use]
    pub fn apply(today: NaiveDate, previous: Option<StreakStamp>) -> StreakUpdate {
        let Some(previous) = previous else {
            return StreakUpdate {
                previous: StreakState::NoRecord,
                streak: 1,
                today,
            };
        };

        let state = StreakState::classify(today, previous.last_activity_date);
        let streak = match state {
            StreakState::ActiveYesterday => previous.streak.saturating_add(1),
            StreakState::ActiveToday => previous.streak,
            StreakState::NoRecord | StreakState::Stale => 1,
        };

        StreakUpdate {
            previous: state,
            streak,
            today,
        }
    }
}

/// Streak as it should be shown today, without writing anything.
///
/// A stored streak whose last activity is older than yesterday is already
/// broken and reads as 0; it is only rewritten by the next activity.
#[must_use]
pub fn display_streak(today: NaiveDate, stamp: StreakStamp) -> u32 {
    match StreakState::classify(today, stamp.last_activity_date) {
        StreakState::ActiveToday | StreakState::ActiveYesterday => stamp.streak,
        StreakState::NoRecord | StreakState::Stale => 0,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
