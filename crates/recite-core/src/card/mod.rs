//! Card Module
//!
//! The data model for the study domain:
//! - Cards (cloze and vocabulary flashcards) with their scheduling state
//! - Study contexts that group cards around a real-life scenario
//! - The append-only review history
//! - Intake types and normalization for externally generated candidate cards

mod context;
mod item;
mod normalize;
mod review;

pub use context::{ContextSummary, NewContext, StudyContext};
pub use item::{Card, CardKind, ImportStats, NewCard};
pub use normalize::{normalize_lemma, normalize_prompt};
pub use review::{ReviewOutcome, ReviewRecord};
