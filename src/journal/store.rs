//! Entry store: append-only, per-user, chronologically ordered.
//!
//! [`append_entry`] is the only write. It runs in a transaction that re-checks
//! ordering against the user's latest entry, inserts the row and its vector,
//! and writes an audit record. Reads never see a half-written entry.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection, OptionalExtension};

use super::types::{CorpusEntry, Entry, EntryDraft};
use super::{embedding_from_bytes, embedding_to_bytes};
use crate::error::StoreError;
use crate::sentiment::Sentiment;

const ENTRY_COLUMNS: &str = "e.id, e.user_id, e.created_at, e.text, e.sentiment, e.summary, \
                             e.tags, e.truncated, e.embedding_model, v.embedding";

/// Append an annotated entry to `user`'s journal, stamped `created_at`.
///
/// Fails with [`StoreError::OutOfOrder`] if `created_at` is earlier than the
/// user's latest entry. Equal timestamps are allowed.
pub fn append_entry(
    conn: &mut Connection,
    user: &str,
    draft: &EntryDraft,
    created_at: DateTime<FixedOffset>,
) -> Result<Entry, StoreError> {
    let tx = conn.transaction()?;

    let created_ts = created_at.timestamp_millis();
    let latest: Option<(i64, String)> = tx
        .query_row(
            "SELECT created_ts, created_at FROM entries WHERE user_id = ?1 ORDER BY seq DESC LIMIT 1",
            params![user],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    if let Some((latest_ts, latest_at)) = latest {
        if created_ts < latest_ts {
            return Err(StoreError::OutOfOrder {
                latest: latest_at,
                attempted: created_at.to_rfc3339(),
            });
        }
    }

    let id = uuid::Uuid::now_v7().to_string();
    let tags_json = serde_json::to_string(&draft.tags)
        .map_err(|e| StoreError::Corrupt(format!("tags not serializable: {e}")))?;

    tx.execute(
        "INSERT INTO entries (id, user_id, created_at, created_ts, text, sentiment, summary, tags, truncated, embedding_model) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            user,
            created_at.to_rfc3339(),
            created_ts,
            draft.text,
            draft.sentiment.as_str(),
            draft.summary,
            tags_json,
            draft.truncated,
            draft.embedding_model,
        ],
    )?;

    tx.execute(
        "INSERT INTO entry_vectors (entry_id, embedding) VALUES (?1, ?2)",
        params![id, embedding_to_bytes(&draft.embedding)],
    )?;

    write_audit_log(
        &tx,
        "create",
        user,
        Some(&id),
        Some(&serde_json::json!({ "sentiment": draft.sentiment.as_str() })),
    )?;

    tx.commit()?;

    tracing::debug!(user, entry_id = %id, "entry appended");

    Ok(Entry {
        id,
        user_id: user.to_string(),
        created_at,
        text: draft.text.clone(),
        sentiment: draft.sentiment,
        summary: draft.summary.clone(),
        tags: draft.tags.clone(),
        truncated: draft.truncated,
        embedding: draft.embedding.clone(),
        embedding_model: draft.embedding_model.clone(),
    })
}

/// All of `user`'s entries in chronological order. Unknown user → empty.
pub fn list_entries(conn: &Connection, user: &str) -> Result<Vec<Entry>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e \
         JOIN entry_vectors v ON v.entry_id = e.id \
         WHERE e.user_id = ?1 ORDER BY e.seq ASC"
    ))?;
    let rows = stmt
        .query_map(params![user], RawEntry::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(RawEntry::into_entry).collect()
}

/// The `limit` most recent entries, newest first.
pub fn recent_entries(conn: &Connection, user: &str, limit: usize) -> Result<Vec<Entry>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e \
         JOIN entry_vectors v ON v.entry_id = e.id \
         WHERE e.user_id = ?1 ORDER BY e.seq DESC LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(params![user, limit as i64], RawEntry::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(RawEntry::into_entry).collect()
}

/// One entry by id, scoped to `user`.
pub fn get_entry(conn: &Connection, user: &str, id: &str) -> Result<Option<Entry>, StoreError> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM entries e \
                 JOIN entry_vectors v ON v.entry_id = e.id \
                 WHERE e.user_id = ?1 AND e.id = ?2"
            ),
            params![user, id],
            RawEntry::from_row,
        )
        .optional()?;
    raw.map(RawEntry::into_entry).transpose()
}

/// Number of entries `user` has written.
pub fn entry_count(conn: &Connection, user: &str) -> Result<usize, StoreError> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entries WHERE user_id = ?1",
        params![user],
        |row| row.get(0),
    )?;
    Ok(n as usize)
}

/// Chronological `(id, embedding)` pairs of `user`'s entries encoded by `model`.
///
/// Entries from other encoders are left out; their vectors live in a
/// different space and would produce meaningless scores.
pub fn corpus_snapshot(
    conn: &Connection,
    user: &str,
    model: &str,
) -> Result<Vec<CorpusEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT e.id, v.embedding FROM entries e \
         JOIN entry_vectors v ON v.entry_id = e.id \
         WHERE e.user_id = ?1 AND e.embedding_model = ?2 ORDER BY e.seq ASC",
    )?;
    let rows = stmt
        .query_map(params![user, model], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, blob)| {
            let embedding = embedding_from_bytes(&blob)
                .ok_or_else(|| StoreError::Corrupt(format!("embedding blob for {id}")))?;
            Ok(CorpusEntry { id, embedding })
        })
        .collect()
}

/// Write a row to the `entry_log` audit table.
pub(crate) fn write_audit_log(
    conn: &Connection,
    operation: &str,
    user: &str,
    entry_id: Option<&str>,
    details: Option<&serde_json::Value>,
) -> Result<(), StoreError> {
    let now = chrono::Utc::now().to_rfc3339();
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO entry_log (operation, user_id, entry_id, details, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![operation, user, entry_id, details_json, now],
    )?;
    Ok(())
}

/// Column values as read from SQLite, before validation.
struct RawEntry {
    id: String,
    user_id: String,
    created_at: String,
    text: String,
    sentiment: String,
    summary: String,
    tags: String,
    truncated: bool,
    embedding_model: String,
    embedding: Vec<u8>,
}

impl RawEntry {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            created_at: row.get(2)?,
            text: row.get(3)?,
            sentiment: row.get(4)?,
            summary: row.get(5)?,
            tags: row.get(6)?,
            truncated: row.get(7)?,
            embedding_model: row.get(8)?,
            embedding: row.get(9)?,
        })
    }

    fn into_entry(self) -> Result<Entry, StoreError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Corrupt(format!("created_at of {}: {e}", self.id)))?;
        let sentiment: Sentiment = self.sentiment.parse().map_err(StoreError::Corrupt)?;
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags)
            .map_err(|e| StoreError::Corrupt(format!("tags of {}: {e}", self.id)))?;
        let embedding = embedding_from_bytes(&self.embedding)
            .ok_or_else(|| StoreError::Corrupt(format!("embedding blob for {}", self.id)))?;

        Ok(Entry {
            id: self.id,
            user_id: self.user_id,
            created_at,
            text: self.text,
            sentiment,
            summary: self.summary,
            tags,
            truncated: self.truncated,
            embedding,
            embedding_model: self.embedding_model,
        })
    }
}
