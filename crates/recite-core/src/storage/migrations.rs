//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: contexts, cards, reviews",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Owner-scoped review index for history queries",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS contexts (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    level TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contexts_owner ON contexts(owner_id, updated_at);

CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    context_id TEXT NOT NULL REFERENCES contexts(id) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK (kind IN ('cloze', 'vocab')),

    -- Content, opaque to the scheduler
    prompt TEXT NOT NULL,
    answer TEXT NOT NULL,
    choices TEXT,
    explanation TEXT,
    lemma TEXT,

    -- Scheduling state, mutated only by the review commit protocol
    ease REAL NOT NULL DEFAULT 2.5 CHECK (ease >= 1.3),
    interval INTEGER NOT NULL DEFAULT 0 CHECK (interval >= 0),
    due TEXT NOT NULL,

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Due-item selection scans owner + due; dedup on intake probes lemma/prompt
CREATE INDEX IF NOT EXISTS idx_cards_owner_due ON cards(owner_id, due);
CREATE INDEX IF NOT EXISTS idx_cards_context ON cards(context_id);
CREATE INDEX IF NOT EXISTS idx_cards_owner_lemma ON cards(owner_id, lemma);

-- Append-only review history; one row per committed review
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    owner_id TEXT NOT NULL,
    grade INTEGER NOT NULL CHECK (grade IN (0, 3, 4, 5)),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reviews_card ON reviews(card_id);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: History listings filter by owner and sort by commit time
const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_reviews_owner_created ON reviews(owner_id, created_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
