//! Journal record types.
//!
//! An [`EntryDraft`] is a fully annotated entry that has not been stored yet;
//! the store turns it into an [`Entry`] by assigning an id and timestamp.
//! [`SimilarityMatch`] is derived per query and never persisted.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::sentiment::Sentiment;

/// A stored journal entry. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// UUID v7, so ids sort by creation time.
    pub id: String,
    pub user_id: String,
    /// Writer's local time; calendar dates are taken in this offset.
    pub created_at: DateTime<FixedOffset>,
    /// The original text, never truncated.
    pub text: String,
    pub sentiment: Sentiment,
    pub summary: String,
    pub tags: BTreeSet<String>,
    /// Whether the classifier only saw the head of `text`.
    pub truncated: bool,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub embedding_model: String,
}

impl Entry {
    /// Calendar date the entry was written on.
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// An annotated entry waiting to be appended.
#[derive(Debug, Clone, Serialize)]
pub struct EntryDraft {
    pub text: String,
    pub sentiment: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub truncated: bool,
    pub summary: String,
    pub tags: BTreeSet<String>,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub embedding_model: String,
}

/// A prior entry judged similar to a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatch {
    pub entry_id: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// One prior embedding in a user's corpus snapshot.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub id: String,
    pub embedding: Vec<f32>,
}

/// Result of writing an entry: the stored entry plus its reflection, if any.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedEntry {
    #[serde(flatten)]
    pub entry: Entry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar: Option<SimilarityMatch>,
}
