//! Study Context - A real-life scenario that groups cards
//!
//! Users describe a situation ("airport check-in", "doctor's appointment")
//! and cards are generated for it. The context is pure grouping: the
//! scheduler only ever sees individual cards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scenario grouping a set of cards
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyContext {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// The user who owns this context
    pub owner_id: String,
    /// Short scenario title
    pub title: String,
    /// CEFR-style difficulty label (A1..C2)
    pub level: String,
    /// Free-form scenario description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the context was created
    pub created_at: DateTime<Utc>,
    /// When the context or its card set last changed
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewContext {
    /// Short scenario title
    pub title: String,
    /// CEFR-style difficulty label
    pub level: String,
    /// Free-form scenario description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A context plus its card counts, as shown in listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    /// The context itself
    #[serde(flatten)]
    pub context: StudyContext,
    /// Cards currently due for review
    pub due_count: i64,
    /// All cards in this context
    pub total_cards: i64,
}
