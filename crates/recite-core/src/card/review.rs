//! Review history and commit results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sm2::Grade;

/// One graded review event, append-only.
///
/// Records are never updated or deleted by the scheduler; retention is an
/// external concern.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Monotonic row id; within one card, reflects submission order
    pub id: i64,
    /// The card that was reviewed
    pub card_id: String,
    /// The user who submitted the grade
    pub owner_id: String,
    /// Self-reported recall quality
    pub grade: Grade,
    /// Server-assigned commit timestamp
    pub created_at: DateTime<Utc>,
}

/// What a successful review commit returns to the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// New absolute due timestamp
    pub next_due: DateTime<Utc>,
    /// Updated ease factor
    pub ease: f64,
    /// Updated interval in days
    pub interval: i64,
}
