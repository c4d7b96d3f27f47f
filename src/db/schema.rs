//! SQL DDL for the journal tables.
//!
//! Defines `entries`, `entry_vectors` (vec0), `entry_log` and `schema_meta`.
//! All DDL uses `IF NOT EXISTS` for idempotent initialization. Later tables
//! arrive through [`super::migrations`].

use rusqlite::Connection;

use crate::embedding::EMBEDDING_DIM;

const SCHEMA_SQL: &str = r#"
-- Append-only journal entries; seq is insertion (= chronological) order
CREATE TABLE IF NOT EXISTS entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    created_ts INTEGER NOT NULL,
    text TEXT NOT NULL CHECK(length(trim(text)) > 0),
    sentiment TEXT NOT NULL CHECK(sentiment IN ('POSITIVE','NEGATIVE','NEUTRAL','UNKNOWN')),
    summary TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '[]',
    truncated INTEGER NOT NULL DEFAULT 0,
    embedding_model TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_user_seq ON entries(user_id, seq);

-- Audit log
CREATE TABLE IF NOT EXISTS entry_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('create','seal_note')),
    user_id TEXT NOT NULL,
    entry_id TEXT,
    details TEXT,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // vec0 fixes the dimensionality, so a wrong-sized embedding can never be stored.
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS entry_vectors USING vec0(
            entry_id TEXT PRIMARY KEY,
            embedding FLOAT[{EMBEDDING_DIM}]
        );"
    ))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
