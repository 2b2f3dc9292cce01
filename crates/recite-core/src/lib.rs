//! # Recite Core
//!
//! The study engine behind recite, a context-based language study app:
//! describe a real-life scenario, have cards generated for it, and review
//! them on an SM-2 spaced-repetition schedule.
//!
//! Three pieces:
//!
//! - **SM-2 scheduler** ([`sm2`]): a pure function from
//!   `(ease, interval, grade, now)` to the next schedule. No storage, no
//!   ambient clock.
//! - **Review commit protocol** ([`Store::submit_review`]): fetches the
//!   owner's card, runs the scheduler, and atomically persists the updated
//!   card together with one append-only history row.
//! - **Due-item selection** ([`Store::next_due`]): `due <= now`,
//!   oldest-due-first.
//!
//! Card generation, authentication, and rendering live outside this crate;
//! it only ever sees opaque owner ids and card content.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recite_core::{Grade, NewContext, Store};
//!
//! # fn main() -> recite_core::Result<()> {
//! let store = Store::new(None)?;
//!
//! let context = store.create_context(
//!     "ana",
//!     NewContext {
//!         title: "Airport check-in".to_string(),
//!         level: "B1".to_string(),
//!         notes: None,
//!     },
//! )?;
//!
//! // ... import generated cards into the context ...
//!
//! if let Some(card) = store.next_due("ana", Some(&context.id))? {
//!     let outcome = store.submit_review("ana", &card.id, Grade::Good)?;
//!     println!("next due {}", outcome.next_due);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod card;
pub mod sm2;
pub mod storage;

// Data model
pub use card::{
    Card, CardKind, ContextSummary, ImportStats, NewCard, NewContext, ReviewOutcome, ReviewRecord,
    StudyContext,
};

// Scheduler
pub use sm2::{next_schedule, Grade, Schedule, MIN_EASE, STARTING_EASE};

// Storage layer
pub use storage::{Result, Store, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
