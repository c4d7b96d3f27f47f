//! Sealed notes to your future self.
//!
//! Each user has at most one note. Sealing again replaces it.

use chrono::{Days, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::store::write_audit_log;
use super::types::Entry;
use crate::error::{NoteError, StoreError, ValidationError};
use crate::sentiment::Sentiment;

pub const MAX_REVEAL_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FutureNote {
    pub text: String,
    pub written_on: NaiveDate,
    pub reveal_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NoteStatus {
    Missing,
    Locked { reveal_on: NaiveDate },
    Unlocked(FutureNote),
}

/// Seal `text` for `user`, readable `days` days after `today`.
pub fn seal_note(
    conn: &Connection,
    user: &str,
    text: &str,
    days: u32,
    today: NaiveDate,
) -> Result<FutureNote, NoteError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty.into());
    }
    if !(1..=MAX_REVEAL_DAYS).contains(&days) {
        return Err(ValidationError::RevealOutOfRange {
            days,
            max: MAX_REVEAL_DAYS,
        }
        .into());
    }
    let reveal_on = today
        .checked_add_days(Days::new(days.into()))
        .ok_or_else(|| StoreError::Corrupt(format!("reveal date overflows from {today}")))?;

    let tx = conn.unchecked_transaction().map_err(StoreError::from)?;
    tx.execute(
        "INSERT OR REPLACE INTO future_notes (user_id, text, written_on, reveal_on) VALUES (?1, ?2, ?3, ?4)",
        params![user, text, today.to_string(), reveal_on.to_string()],
    )
    .map_err(StoreError::from)?;
    write_audit_log(
        &tx,
        "seal_note",
        user,
        None,
        Some(&serde_json::json!({ "reveal_on": reveal_on.to_string() })),
    )?;
    tx.commit().map_err(StoreError::from)?;

    tracing::info!(user, %reveal_on, "future note sealed");

    Ok(FutureNote {
        text: text.to_string(),
        written_on: today,
        reveal_on,
    })
}

/// Look at `user`'s note as of `today`. The text stays hidden until the reveal date.
pub fn open_note(conn: &Connection, user: &str, today: NaiveDate) -> Result<NoteStatus, StoreError> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT text, written_on, reveal_on FROM future_notes WHERE user_id = ?1",
            params![user],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((text, written_on, reveal_on)) = row else {
        return Ok(NoteStatus::Missing);
    };
    let parse = |s: &str| {
        s.parse::<NaiveDate>()
            .map_err(|e| StoreError::Corrupt(format!("future note date {s}: {e}")))
    };
    let written_on = parse(&written_on)?;
    let reveal_on = parse(&reveal_on)?;

    if today < reveal_on {
        return Ok(NoteStatus::Locked { reveal_on });
    }
    Ok(NoteStatus::Unlocked(FutureNote {
        text,
        written_on,
        reveal_on,
    }))
}

/// Note text built from the journal so far.
pub fn generated_note_text(name: &str, entries: &[Entry]) -> String {
    let positive = entries
        .iter()
        .filter(|e| e.sentiment == Sentiment::Positive)
        .count();
    let negative = entries
        .iter()
        .filter(|e| e.sentiment == Sentiment::Negative)
        .count();
    format!(
        "Hey {name}, you've written {} entries. You've had {positive} positive and {negative} tough days. You're doing great, keep going.",
        entries.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn note_is_locked_until_reveal_date() {
        let conn = db::open_memory_database().unwrap();
        let note = seal_note(&conn, "ana", "Remember the lake.", 7, day(1, 1)).unwrap();
        assert_eq!(note.reveal_on, day(1, 8));

        assert_eq!(
            open_note(&conn, "ana", day(1, 7)).unwrap(),
            NoteStatus::Locked { reveal_on: day(1, 8) }
        );
        match open_note(&conn, "ana", day(1, 8)).unwrap() {
            NoteStatus::Unlocked(n) => assert_eq!(n.text, "Remember the lake."),
            other => panic!("expected unlocked note, got {other:?}"),
        }
    }

    #[test]
    fn missing_note() {
        let conn = db::open_memory_database().unwrap();
        assert_eq!(open_note(&conn, "ana", day(1, 1)).unwrap(), NoteStatus::Missing);
    }

    #[test]
    fn sealing_again_replaces() {
        let conn = db::open_memory_database().unwrap();
        seal_note(&conn, "ana", "first", 1, day(1, 1)).unwrap();
        seal_note(&conn, "ana", "second", 1, day(1, 1)).unwrap();
        match open_note(&conn, "ana", day(1, 2)).unwrap() {
            NoteStatus::Unlocked(n) => assert_eq!(n.text, "second"),
            other => panic!("expected unlocked note, got {other:?}"),
        }
    }

    #[test]
    fn failed_audit_keeps_previous_note() {
        let conn = db::open_memory_database().unwrap();
        seal_note(&conn, "ana", "first", 1, day(1, 1)).unwrap();

        conn.execute_batch(
            "CREATE TEMP TRIGGER reject_audit BEFORE INSERT ON entry_log
             BEGIN SELECT RAISE(ABORT, 'audit unavailable'); END;",
        )
        .unwrap();
        let err = seal_note(&conn, "ana", "second", 1, day(1, 1)).unwrap_err();
        assert!(matches!(err, NoteError::Store(StoreError::Sqlite(_))));

        match open_note(&conn, "ana", day(1, 2)).unwrap() {
            NoteStatus::Unlocked(n) => assert_eq!(n.text, "first"),
            other => panic!("expected unlocked note, got {other:?}"),
        }
    }

    #[test]
    fn reveal_days_are_bounded() {
        let conn = db::open_memory_database().unwrap();
        for days in [0, 31] {
            let err = seal_note(&conn, "ana", "hello", days, day(1, 1)).unwrap_err();
            assert!(matches!(
                err,
                NoteError::Validation(ValidationError::RevealOutOfRange { .. })
            ));
        }
        assert!(matches!(
            seal_note(&conn, "ana", "  ", 3, day(1, 1)).unwrap_err(),
            NoteError::Validation(ValidationError::Empty)
        ));
    }

    #[test]
    fn generated_text_counts_moods() {
        assert_eq!(
            generated_note_text("Sam", &[]),
            "Hey Sam, you've written 0 entries. You've had 0 positive and 0 tough days. You're doing great, keep going."
        );
    }
}
