//! SQLite Storage Implementation
//!
//! Owner-scoped persistence for contexts, cards, and the append-only review
//! history, plus the review commit protocol that ties the scheduler to the
//! database.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::card::{
    normalize_lemma, normalize_prompt, Card, CardKind, ContextSummary, ImportStats, NewCard,
    NewContext, ReviewOutcome, ReviewRecord, StudyContext,
};
use crate::sm2::{self, Grade, Schedule, STARTING_EASE};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Card or context missing, or not owned by the caller. The two cases
    /// are deliberately indistinguishable so existence of other users' data
    /// never leaks.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Grade outside the closed set {0, 3, 4, 5}; rejected before any write
    #[error("Invalid grade: {0} (must be one of 0, 3, 4, 5)")]
    InvalidGrade(i64),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// STORE
// ============================================================================

/// SQLite-backed store.
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self` (not `&mut self`), making Store `Send + Sync` so
/// callers can share it behind an `Arc` without an outer mutex.
///
/// Concurrent review submissions serialize on the writer connection;
/// conflicting submissions for the same card are last-writer-wins on the card
/// row while every submitted grade still lands in the history table.
pub struct Store {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl Store {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open (or create) a store.
    ///
    /// With no explicit path, the database lands in the platform data
    /// directory (e.g. `~/.local/share/recite/recite.db` on Linux).
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("app", "recite", "recite").ok_or_else(|| {
                    StoreError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("recite.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
        })
    }

    // ========================================================================
    // CONTEXTS
    // ========================================================================

    /// Create a study context
    pub fn create_context(&self, owner_id: &str, input: NewContext) -> Result<StudyContext> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        {
            let writer = self
                .writer
                .lock()
                .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
            writer.execute(
                "INSERT INTO contexts (id, owner_id, title, level, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, owner_id, input.title, input.level, input.notes, now, now],
            )?;
        }

        self.get_context(owner_id, &id)?
            .ok_or(StoreError::NotFound(id))
    }

    /// Fetch a context by id, owner-scoped
    pub fn get_context(&self, owner_id: &str, id: &str) -> Result<Option<StudyContext>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let context = reader
            .query_row(
                "SELECT id, owner_id, title, level, notes, created_at, updated_at
                 FROM contexts WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
                Self::row_to_context,
            )
            .optional()?;
        Ok(context)
    }

    /// List the owner's contexts with due/total card counts, most recently
    /// updated first
    pub fn list_contexts(&self, owner_id: &str) -> Result<Vec<ContextSummary>> {
        let now = Utc::now();

        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT c.id, c.owner_id, c.title, c.level, c.notes, c.created_at, c.updated_at,
                    (SELECT COUNT(*) FROM cards WHERE context_id = c.id AND due <= ?2) AS due_count,
                    (SELECT COUNT(*) FROM cards WHERE context_id = c.id) AS total_cards
             FROM contexts c
             WHERE c.owner_id = ?1
             ORDER BY c.updated_at DESC",
        )?;

        let rows = stmt.query_map(params![owner_id, now], |row| {
            Ok(ContextSummary {
                context: Self::row_to_context(row)?,
                due_count: row.get("due_count")?,
                total_cards: row.get("total_cards")?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Delete a context and (via cascade) its cards and their history.
    /// Returns false when nothing matched.
    pub fn delete_context(&self, owner_id: &str, id: &str) -> Result<bool> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
        let deleted = writer.execute(
            "DELETE FROM contexts WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // CARD INTAKE
    // ========================================================================

    /// Persist a batch of candidate cards from the (external) generator.
    ///
    /// Candidates are normalized, de-duplicated within the batch by lemma
    /// (falling back to the lowercased prompt) and against the owner's
    /// existing cards by lemma or exact prompt, then inserted in a single
    /// transaction with fresh scheduling state: ease 2.5, interval 0, due
    /// now. Duplicates are counted as skipped, not treated as errors.
    pub fn add_cards(
        &self,
        owner_id: &str,
        context_id: &str,
        cards: Vec<NewCard>,
    ) -> Result<ImportStats> {
        let now = Utc::now();
        let mut stats = ImportStats::default();

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction()?;

        let owned: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM contexts WHERE id = ?1 AND owner_id = ?2",
                params![context_id, owner_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(StoreError::NotFound(context_id.to_string()));
        }

        let mut seen: HashSet<String> = HashSet::new();
        for card in cards {
            let prompt = normalize_prompt(&card.prompt);
            let lemma = card.lemma.as_deref().and_then(normalize_lemma);

            let key = lemma
                .clone()
                .unwrap_or_else(|| format!("prompt:{}", prompt.to_lowercase()));
            if !seen.insert(key) {
                stats.skipped += 1;
                continue;
            }

            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM cards
                     WHERE owner_id = ?1
                       AND (prompt = ?2 OR (lemma IS NOT NULL AND lemma = ?3))
                     LIMIT 1",
                    params![owner_id, prompt, lemma],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                stats.skipped += 1;
                continue;
            }

            tx.execute(
                "INSERT INTO cards (
                    id, owner_id, context_id, kind,
                    prompt, answer, choices, explanation, lemma,
                    ease, interval, due, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    Uuid::new_v4().to_string(),
                    owner_id,
                    context_id,
                    card.kind.as_str(),
                    prompt,
                    card.answer.trim(),
                    card.choices,
                    card.explanation.as_deref().map(str::trim),
                    lemma,
                    STARTING_EASE,
                    0i64,
                    now,
                    now,
                    now,
                ],
            )?;

            match card.kind {
                CardKind::Cloze => stats.created_cloze += 1,
                CardKind::Vocab => stats.created_vocab += 1,
            }
        }

        tx.execute(
            "UPDATE contexts SET updated_at = ?1 WHERE id = ?2",
            params![now, context_id],
        )?;
        tx.commit()?;

        tracing::info!(
            context = context_id,
            created = stats.created(),
            skipped = stats.skipped,
            "card batch imported"
        );
        Ok(stats)
    }

    // ========================================================================
    // CARD QUERIES
    // ========================================================================

    /// Fetch a card by id, owner-scoped
    pub fn get_card(&self, owner_id: &str, id: &str) -> Result<Option<Card>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        Ok(Self::card_by_id(&reader, owner_id, id)?)
    }

    /// All cards in a context, oldest-due first
    pub fn cards_for_context(&self, owner_id: &str, context_id: &str) -> Result<Vec<Card>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT * FROM cards
             WHERE owner_id = ?1 AND context_id = ?2
             ORDER BY due ASC",
        )?;

        let rows = stmt.query_map(params![owner_id, context_id], Self::row_to_card)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// The next card due for review: `due <= now`, oldest due first,
    /// optionally restricted to one context. Returns `None` when nothing is
    /// due.
    pub fn next_due(&self, owner_id: &str, context_id: Option<&str>) -> Result<Option<Card>> {
        let now = Utc::now();

        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let card = match context_id {
            Some(context) => reader
                .query_row(
                    "SELECT * FROM cards
                     WHERE owner_id = ?1 AND context_id = ?2 AND due <= ?3
                     ORDER BY due ASC
                     LIMIT 1",
                    params![owner_id, context, now],
                    Self::row_to_card,
                )
                .optional()?,
            None => reader
                .query_row(
                    "SELECT * FROM cards
                     WHERE owner_id = ?1 AND due <= ?2
                     ORDER BY due ASC
                     LIMIT 1",
                    params![owner_id, now],
                    Self::row_to_card,
                )
                .optional()?,
        };
        Ok(card)
    }

    /// How many of the owner's cards are currently due, optionally within one
    /// context
    pub fn due_count(&self, owner_id: &str, context_id: Option<&str>) -> Result<i64> {
        let now = Utc::now();

        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let count = match context_id {
            Some(context) => reader.query_row(
                "SELECT COUNT(*) FROM cards
                 WHERE owner_id = ?1 AND context_id = ?2 AND due <= ?3",
                params![owner_id, context, now],
                |row| row.get(0),
            )?,
            None => reader.query_row(
                "SELECT COUNT(*) FROM cards WHERE owner_id = ?1 AND due <= ?2",
                params![owner_id, now],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    // ========================================================================
    // REVIEW COMMIT PROTOCOL
    // ========================================================================

    /// Numeric boundary for [`Store::submit_review`]: validates the quality
    /// value against the closed grade set before touching storage.
    pub fn submit_graded(
        &self,
        owner_id: &str,
        card_id: &str,
        quality: i64,
    ) -> Result<ReviewOutcome> {
        let grade = Grade::from_quality(quality).ok_or(StoreError::InvalidGrade(quality))?;
        self.submit_review(owner_id, card_id, grade)
    }

    /// Commit one graded review.
    ///
    /// Within a single transaction: fetch the card (owner-scoped), run the
    /// scheduler, update the card's scheduling state, and append one history
    /// row. Both writes land together or not at all; a reader never observes
    /// the updated card without its matching review record, or vice versa.
    pub fn submit_review(
        &self,
        owner_id: &str,
        card_id: &str,
        grade: Grade,
    ) -> Result<ReviewOutcome> {
        let now = Utc::now();

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction()?;

        let card = Self::card_by_id(&tx, owner_id, card_id)?
            .ok_or_else(|| StoreError::NotFound(card_id.to_string()))?;

        let schedule = sm2::next_schedule(card.ease, card.interval, grade, now);
        Self::apply_review(&tx, &card, &schedule, grade.quality(), now)?;
        tx.commit()?;

        tracing::debug!(
            card = card_id,
            grade = %grade,
            interval = schedule.interval,
            "review committed"
        );

        Ok(ReviewOutcome {
            next_due: schedule.next_due,
            ease: schedule.ease,
            interval: schedule.interval,
        })
    }

    /// The two writes of the commit protocol. Callers are responsible for
    /// wrapping this in a transaction; `quality` must already be validated
    /// (the reviews CHECK constraint is the backstop).
    fn apply_review(
        conn: &Connection,
        card: &Card,
        schedule: &Schedule,
        quality: i64,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<()> {
        conn.execute(
            "UPDATE cards SET ease = ?1, interval = ?2, due = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                schedule.ease,
                schedule.interval,
                schedule.next_due,
                now,
                card.id
            ],
        )?;
        conn.execute(
            "INSERT INTO reviews (card_id, owner_id, grade, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![card.id, card.owner_id, quality, now],
        )?;
        Ok(())
    }

    /// Review history for a card in submission order
    pub fn reviews_for_card(&self, owner_id: &str, card_id: &str) -> Result<Vec<ReviewRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StoreError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT id, card_id, owner_id, grade, created_at
             FROM reviews
             WHERE card_id = ?1 AND owner_id = ?2
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![card_id, owner_id], Self::row_to_review)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    fn card_by_id(
        conn: &Connection,
        owner_id: &str,
        card_id: &str,
    ) -> rusqlite::Result<Option<Card>> {
        conn.query_row(
            "SELECT * FROM cards WHERE id = ?1 AND owner_id = ?2",
            params![card_id, owner_id],
            Self::row_to_card,
        )
        .optional()
    }

    fn row_to_context(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudyContext> {
        Ok(StudyContext {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            title: row.get("title")?,
            level: row.get("level")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn row_to_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<Card> {
        let kind: String = row.get("kind")?;
        Ok(Card {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            context_id: row.get("context_id")?,
            kind: CardKind::parse_name(&kind),
            prompt: row.get("prompt")?,
            answer: row.get("answer")?,
            choices: row.get("choices")?,
            explanation: row.get("explanation")?,
            lemma: row.get("lemma")?,
            ease: row.get("ease")?,
            interval: row.get("interval")?,
            due: row.get("due")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn row_to_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReviewRecord> {
        let quality: i64 = row.get("grade")?;
        let grade = Grade::from_quality(quality).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Integer,
                format!("grade {quality} outside the closed set").into(),
            )
        })?;
        Ok(ReviewRecord {
            id: row.get("id")?,
            card_id: row.get("card_id")?,
            owner_id: row.get("owner_id")?,
            grade,
            created_at: row.get("created_at")?,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(Some(dir.path().join("test.db"))).unwrap();
        (store, dir)
    }

    fn seed_card(store: &Store, owner: &str) -> Card {
        let context = store
            .create_context(
                owner,
                NewContext {
                    title: "Airport check-in".to_string(),
                    level: "B1".to_string(),
                    notes: None,
                },
            )
            .unwrap();
        let stats = store
            .add_cards(
                owner,
                &context.id,
                vec![NewCard {
                    kind: CardKind::Cloze,
                    prompt: "Please place your ____ on the belt.".to_string(),
                    answer: "luggage".to_string(),
                    choices: Some(serde_json::json!(["luggage", "boarding", "gate"])),
                    explanation: Some("Common check-in phrase".to_string()),
                    lemma: Some("luggage".to_string()),
                }],
            )
            .unwrap();
        assert_eq!(stats.created(), 1);
        store.next_due(owner, None).unwrap().unwrap()
    }

    #[test]
    fn new_cards_start_with_default_schedule() {
        let (store, _dir) = test_store();
        let card = seed_card(&store, "ana");
        assert_eq!(card.ease, STARTING_EASE);
        assert_eq!(card.interval, 0);
        assert!(card.is_due_at(Utc::now()));
    }

    #[test]
    fn intake_dedupes_within_batch_and_against_existing() {
        let (store, _dir) = test_store();
        let context = store
            .create_context(
                "ana",
                NewContext {
                    title: "Restaurant".to_string(),
                    level: "A2".to_string(),
                    notes: None,
                },
            )
            .unwrap();

        let vocab = |word: &str| NewCard {
            kind: CardKind::Vocab,
            prompt: word.to_string(),
            answer: format!("tr-{word}"),
            choices: None,
            explanation: None,
            lemma: Some(word.to_string()),
        };

        let stats = store
            .add_cards(
                "ana",
                &context.id,
                vec![vocab("waiter"), vocab("Waiter!"), vocab("menu")],
            )
            .unwrap();
        // "Waiter!" normalizes to the same lemma as "waiter"
        assert_eq!(stats.created_vocab, 2);
        assert_eq!(stats.skipped, 1);

        // A second batch with an already-persisted lemma only skips
        let stats = store.add_cards("ana", &context.id, vec![vocab("menu")]).unwrap();
        assert_eq!(stats.created(), 0);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn intake_into_foreign_context_is_not_found() {
        let (store, _dir) = test_store();
        let context = store
            .create_context(
                "ana",
                NewContext {
                    title: "Pharmacy".to_string(),
                    level: "A2".to_string(),
                    notes: None,
                },
            )
            .unwrap();

        let result = store.add_cards(
            "bruno",
            &context.id,
            vec![NewCard {
                kind: CardKind::Cloze,
                prompt: "p".to_string(),
                answer: "a".to_string(),
                choices: None,
                explanation: None,
                lemma: None,
            }],
        );
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn commit_failure_leaves_card_and_history_untouched() {
        let (store, _dir) = test_store();
        let card = seed_card(&store, "ana");

        // Drive the commit helper with a grade the reviews CHECK constraint
        // rejects: the card UPDATE succeeds, the INSERT fails, and dropping
        // the transaction rolls the whole unit back.
        {
            let mut writer = store.writer.lock().unwrap();
            let tx = writer.transaction().unwrap();
            let schedule = sm2::next_schedule(card.ease, card.interval, Grade::Good, Utc::now());
            let result = Store::apply_review(&tx, &card, &schedule, 7, Utc::now());
            assert!(result.is_err());
        }

        let after = store.get_card("ana", &card.id).unwrap().unwrap();
        assert_eq!(after.ease, card.ease);
        assert_eq!(after.interval, card.interval);
        assert_eq!(after.due, card.due);
        assert!(store.reviews_for_card("ana", &card.id).unwrap().is_empty());
    }

    #[test]
    fn review_of_foreign_card_is_not_found_and_mutates_nothing() {
        let (store, _dir) = test_store();
        let card = seed_card(&store, "ana");

        let result = store.submit_review("bruno", &card.id, Grade::Easy);
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let after = store.get_card("ana", &card.id).unwrap().unwrap();
        assert_eq!(after.interval, card.interval);
        assert!(store.reviews_for_card("ana", &card.id).unwrap().is_empty());
    }

    #[test]
    fn invalid_quality_is_rejected_before_any_write() {
        let (store, _dir) = test_store();
        let card = seed_card(&store, "ana");

        let result = store.submit_graded("ana", &card.id, 2);
        assert!(matches!(result, Err(StoreError::InvalidGrade(2))));
        assert!(store.reviews_for_card("ana", &card.id).unwrap().is_empty());
    }

    #[test]
    fn context_delete_cascades_to_cards_and_reviews() {
        let (store, _dir) = test_store();
        let card = seed_card(&store, "ana");
        store.submit_review("ana", &card.id, Grade::Good).unwrap();

        assert!(store.delete_context("ana", &card.context_id).unwrap());
        assert!(store.get_card("ana", &card.id).unwrap().is_none());
        assert!(store.reviews_for_card("ana", &card.id).unwrap().is_empty());
    }
}
