//! Card - The reviewable unit
//!
//! A card carries two kinds of state:
//! - Content (prompt, answer, choices, explanation, lemma), which the
//!   scheduler never touches
//! - Scheduling state (ease, interval, due), mutated only through the review
//!   commit protocol

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CARD KINDS
// ============================================================================

/// The two kinds of generated flashcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Fill-in-the-blank sentence with multiple choices
    #[default]
    Cloze,
    /// Vocabulary word with translation and usage metadata
    Vocab,
}

impl CardKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Cloze => "cloze",
            CardKind::Vocab => "vocab",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "vocab" => CardKind::Vocab,
            _ => CardKind::Cloze,
        }
    }
}

impl std::fmt::Display for CardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CARD
// ============================================================================

/// A flashcard with its spaced-repetition scheduling state
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// The user who owns (and may review) this card
    pub owner_id: String,
    /// The study context this card belongs to
    pub context_id: String,
    /// Cloze or vocab
    pub kind: CardKind,
    /// The question side: cloze sentence with a blank, or the vocab word
    pub prompt: String,
    /// The expected answer
    pub answer: String,
    /// Kind-specific extras: a string array of options for cloze cards, a
    /// metadata object (part of speech, frequency, sample sentence) for vocab
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<serde_json::Value>,
    /// Short explanation shown after answering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Normalized dictionary form, used for de-duplication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,

    // ========== Scheduling state ==========
    /// SM-2 ease factor, never below 1.3
    pub ease: f64,
    /// Days until next due; 0 means never successfully scheduled
    pub interval: i64,
    /// The card is eligible for review once this timestamp has passed
    pub due: DateTime<Utc>,

    /// When the card was created
    pub created_at: DateTime<Utc>,
    /// When the card was last modified
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Check if this card is due for review
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }
}

// ============================================================================
// INTAKE TYPES
// ============================================================================

/// A candidate card produced by the (external) generation pipeline.
///
/// Uses `deny_unknown_fields` so malformed generator output fails loudly
/// instead of being silently dropped on the floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCard {
    /// Cloze or vocab
    #[serde(default)]
    pub kind: CardKind,
    /// Question side; whitespace is collapsed on intake
    pub prompt: String,
    /// Expected answer
    pub answer: String,
    /// Kind-specific extras (see [`Card::choices`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<serde_json::Value>,
    /// Short explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Dictionary form; normalized on intake and used for de-duplication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
}

/// Outcome of persisting a batch of candidate cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    /// Cloze cards created
    pub created_cloze: i64,
    /// Vocab cards created
    pub created_vocab: i64,
    /// Candidates skipped as duplicates (within the batch or against the
    /// owner's existing cards)
    pub skipped: i64,
}

impl ImportStats {
    /// Total cards created
    pub fn created(&self) -> i64 {
        self.created_cloze + self.created_vocab
    }
}

// ============================================================================
// TESTS
// ============================================================================
