//! SM-2 Scheduling Module
//!
//! The classic SuperMemo-2 spaced repetition function, reduced to the four
//! grades the study UI actually offers (Again/Hard/Good/Easy).
//!
//! Reference: https://super-memory.com/english/ol/sm2.htm
//!
//! The scheduler is a pure function: "now" is an explicit parameter, so the
//! same `(ease, interval, grade, now)` always produces the same output and
//! tests never have to mock the clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Ease factor assigned to a card that has never been reviewed
pub const STARTING_EASE: f64 = 2.5;

/// Floor for the ease factor. Below this the SM-2 growth curve degenerates,
/// so the update formula clamps here.
pub const MIN_EASE: f64 = 1.3;

// ============================================================================
// GRADE
// ============================================================================

/// Self-reported recall quality for a single review.
///
/// The numeric values are SM-2 quality scores; the set is closed. Anything
/// outside `{0, 3, 4, 5}` must be rejected at the boundary before it reaches
/// the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Grade {
    /// Complete blackout; the card goes back to a one-day interval
    Again,
    /// Recalled with serious difficulty
    Hard,
    /// Recalled with some hesitation
    Good,
    /// Perfect recall
    Easy,
}

impl Grade {
    /// Parse a numeric quality value. Returns `None` for anything outside
    /// the closed set `{0, 3, 4, 5}`.
    pub fn from_quality(quality: i64) -> Option<Self> {
        match quality {
            0 => Some(Grade::Again),
            3 => Some(Grade::Hard),
            4 => Some(Grade::Good),
            5 => Some(Grade::Easy),
            _ => None,
        }
    }

    /// The SM-2 quality score this grade carries
    pub fn quality(self) -> i64 {
        match self {
            Grade::Again => 0,
            Grade::Hard => 3,
            Grade::Good => 4,
            Grade::Easy => 5,
        }
    }

    /// Human-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }
}

impl From<Grade> for i64 {
    fn from(grade: Grade) -> i64 {
        grade.quality()
    }
}

impl TryFrom<i64> for Grade {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Grade::from_quality(value)
            .ok_or_else(|| format!("grade must be one of 0, 3, 4, 5 (got {value})"))
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SCHEDULE
// ============================================================================

/// Output of one scheduling step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Updated ease factor, never below [`MIN_EASE`]
    pub ease: f64,
    /// Days until the card is due again, never below 1
    pub interval: i64,
    /// Absolute due timestamp (`now + interval` days)
    pub next_due: DateTime<Utc>,
}

/// Compute the next ease factor, interval, and due timestamp for a card.
///
/// `ease` is the card's current ease factor (callers must not pass values
/// below [`MIN_EASE`]); `interval` is the current interval in days, with `0`
/// meaning the card has never been successfully scheduled.
///
/// Interval rules, in priority order:
/// - `Again` forces a one-day relearn regardless of the previous interval
/// - first successful review: 1 day
/// - second successful review: 3 days
/// - after that: `round(interval * new_ease)`
///
/// All timestamps are UTC, where adding `Duration::days` and calendar-day
/// addition coincide. The rounding step uses `f64::round`
/// (half-away-from-zero).
pub fn next_schedule(ease: f64, interval: i64, grade: Grade, now: DateTime<Utc>) -> Schedule {
    let q = grade.quality() as f64;
    let ease = MIN_EASE.max(ease + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02)));

    let interval = match grade {
        Grade::Again => 1,
        _ if interval == 0 => 1,
        _ if interval == 1 => 3,
        _ => (interval as f64 * ease).round() as i64,
    };

    Schedule {
        ease,
        interval,
        next_due: now + Duration::days(interval),
    }
}

// ============================================================================
// TESTS
// ============================================================================
