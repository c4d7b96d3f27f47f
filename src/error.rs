//! Error taxonomy for the journaling core.
//!
//! [`JournalError`] is what the write path returns: caller-correctable
//! [`ValidationError`]s, [`ModelUnavailable`] when a capability could not
//! produce a result, and [`StoreError`] when persistence failed after the entry
//! was already annotated. Nothing here is retried automatically.

use thiserror::Error;

/// The three model capabilities the core depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Classifier,
    Summarizer,
    Embedder,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier",
            Self::Summarizer => "summarizer",
            Self::Embedder => "embedder",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input problems the writer can fix. Messages are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please write something.")]
    Empty,

    #[error("Journal is too short ({words} words). Try writing at least {min} words.")]
    TooShort { words: usize, min: usize },

    #[error("A future note can be revealed after 1 to {max} days, not {days}.")]
    RevealOutOfRange { days: u32, max: u32 },
}

/// A capability failed, timed out, or returned malformed output.
#[derive(Debug, Clone, Error)]
#[error("{capability} unavailable: {reason}")]
pub struct ModelUnavailable {
    pub capability: Capability,
    pub reason: String,
}

impl ModelUnavailable {
    pub fn new(capability: Capability, reason: impl std::fmt::Display) -> Self {
        Self {
            capability,
            reason: reason.to_string(),
        }
    }
}

/// Entry store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("entry at {attempted} is older than the latest entry ({latest}); backdating is not supported")]
    OutOfOrder { latest: String, attempted: String },

    #[error("corrupt entry row: {0}")]
    Corrupt(String),

    #[error("database connection lock poisoned")]
    LockPoisoned,

    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything that can go wrong while writing an entry.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    ModelUnavailable(#[from] ModelUnavailable),

    #[error("entry was analyzed but could not be saved: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Failures while sealing or opening a future note.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
